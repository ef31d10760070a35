//! Fixed-size worker pool for blocking fetch jobs.
//!
//! # Architecture
//!
//! ```text
//!  submit() ──► unbounded queue ──┬──► fetch-worker-0 ──► job()
//!  (never blocks)                 ├──► fetch-worker-1 ──► job()
//!                                 └──► fetch-worker-N ──► job()
//! ```
//!
//! Workers share one receiver behind a mutex. A worker holds the lock only
//! while waiting for the next job, never while running one.
//!
//! Workers are detached: dropping the pool closes the queue and lets them
//! exit once they finish their current job, without blocking the caller.
//! Call [`FetchWorkerPool::shutdown`] to wait for them instead.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info};

/// Default number of fetch worker threads.
pub const DEFAULT_FETCH_THREADS: usize = 4;

/// Upper bound on fetch worker threads.
pub const MAX_FETCH_THREADS: usize = 16;

/// A unit of work run on a worker thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors from the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool no longer accepts jobs.
    #[error("Fetch worker pool is shut down")]
    ShutDown,

    /// A worker thread could not be started.
    #[error("Failed to spawn fetch worker: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct PoolCounters {
    queued: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Snapshot of pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub threads: usize,
    /// Jobs waiting in the queue.
    pub queued: usize,
    /// Jobs currently running.
    pub active: usize,
    /// Jobs that ran to completion or panicked.
    pub completed: u64,
    /// Jobs that panicked.
    pub panicked: u64,
}

/// Bounded pool of background fetch workers.
pub struct FetchWorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<PoolCounters>,
}

impl FetchWorkerPool {
    /// Start a pool with `threads` workers, clamped to `1..=MAX_FETCH_THREADS`.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        let threads = threads.clamp(1, MAX_FETCH_THREADS);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(threads);
        for i in 0..threads {
            let receiver = Arc::clone(&receiver);
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("fetch-worker-{}", i))
                .spawn(move || worker_loop(receiver, counters))?;
            workers.push(handle);
        }

        info!(threads, "Started fetch worker pool");

        Ok(Self {
            sender: Some(sender),
            workers,
            counters,
        })
    }

    /// Queue a job. Never blocks.
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::ShutDown)?;
        self.counters.queued.fetch_add(1, Ordering::AcqRel);
        sender.send(Box::new(job)).map_err(|_| {
            self.counters.queued.fetch_sub(1, Ordering::AcqRel);
            PoolError::ShutDown
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            threads: self.workers.len(),
            queued: self.counters.queued.load(Ordering::Acquire),
            active: self.counters.active.load(Ordering::Acquire),
            completed: self.counters.completed.load(Ordering::Acquire),
            panicked: self.counters.panicked.load(Ordering::Acquire),
        }
    }

    /// Returns true if no job is queued or running.
    pub fn is_idle(&self) -> bool {
        let stats = self.stats();
        stats.queued == 0 && stats.active == 0
    }

    /// Stop accepting jobs without waiting for the workers.
    ///
    /// Jobs already queued still run. Later calls to [`submit`](Self::submit)
    /// fail with [`PoolError::ShutDown`].
    pub fn close(&mut self) {
        if self.sender.take().is_some() {
            debug!("Fetch worker pool closed");
        }
    }

    /// Close the queue and wait for every worker to finish.
    ///
    /// Jobs already queued still run.
    pub fn shutdown(mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Fetch worker exited abnormally");
            }
        }
        debug!("Fetch worker pool shut down");
    }
}

impl Drop for FetchWorkerPool {
    fn drop(&mut self) {
        // Idle workers exit once the channel closes; running jobs finish on
        // their own and the threads are not joined.
        self.close();
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>, counters: Arc<PoolCounters>) {
    loop {
        let job = receiver.lock().recv();
        let job = match job {
            Ok(job) => job,
            Err(_) => break,
        };

        counters.queued.fetch_sub(1, Ordering::AcqRel);
        counters.active.fetch_add(1, Ordering::AcqRel);

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            counters.panicked.fetch_add(1, Ordering::AcqRel);
            error!(panic = %panic_message(&payload), "Fetch job panicked");
        }

        counters.completed.fetch_add(1, Ordering::AcqRel);
        counters.active.fetch_sub(1, Ordering::AcqRel);
    }
    debug!("Fetch worker exiting");
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
