//! Completion messages from fetch workers to the UI thread.
//!
//! Workers never mutate the cache. When a fetch finishes they send one
//! [`Completion`] over a channel and poke the UI loop through a [`UiWaker`].
//! The thread that owns the map drains the channel and applies the messages.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::debug;

use crate::provider::FetchError;
use crate::tile::{FetchCell, TileKey};

/// Outcome of one fetch job.
#[derive(Debug)]
pub enum Completion {
    /// Bytes were published into the cell; the tile should be redrawn.
    Filled { cell: Arc<FetchCell> },
    /// The zoom changed since the slot was created; remove the slot.
    Stale { cell: Arc<FetchCell> },
    /// The fetch failed; the slot stays empty.
    Failed {
        cell: Arc<FetchCell>,
        error: FetchError,
    },
}

impl Completion {
    /// The cell this completion refers to.
    pub fn cell(&self) -> &Arc<FetchCell> {
        match self {
            Completion::Filled { cell }
            | Completion::Stale { cell }
            | Completion::Failed { cell, .. } => cell,
        }
    }

    pub fn key(&self) -> &TileKey {
        self.cell().key()
    }
}

/// Wakes the UI event loop so it drains pending completions.
///
/// Called from worker threads.
pub trait UiWaker: Send + Sync {
    fn wake(&self);
}

impl<F> UiWaker for F
where
    F: Fn() + Send + Sync,
{
    fn wake(&self) {
        self()
    }
}

/// Waker for loops that poll the completion queue on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWaker;

impl UiWaker for NoopWaker {
    fn wake(&self) {}
}

/// Worker-side handle for delivering completions.
#[derive(Clone)]
pub struct CompletionSender {
    sender: Sender<Completion>,
    waker: Arc<dyn UiWaker>,
}

impl CompletionSender {
    pub fn new(sender: Sender<Completion>, waker: Arc<dyn UiWaker>) -> Self {
        Self { sender, waker }
    }

    /// Send `completion` and wake the UI loop.
    ///
    /// Returns `false` if the receiving side is gone. The result is dropped
    /// in that case; a torn-down map has nothing left to update.
    pub fn deliver(&self, completion: Completion) -> bool {
        match self.sender.send(completion) {
            Ok(()) => {
                self.waker.wake();
                true
            }
            Err(err) => {
                debug!(tile = %err.0.key(), "Map is gone, dropping fetch completion");
                false
            }
        }
    }
}
