//! Background fetch execution.
//!
//! - [`FetchWorkerPool`]: fixed set of worker threads draining a job queue
//! - [`FetchJob`]: fetches one slot's bytes with stale checks around the request
//! - [`Completion`] / [`CompletionSender`]: results marshalled back to the UI thread
//!
//! ```text
//! UI thread                         worker threads
//! ─────────                         ──────────────
//! request_tile ── FetchJob ──► pool ──► fetch ──► publish bytes
//!                                                     │
//! process_completions ◄──── Completion channel ◄──────┘ + wake()
//! ```

mod completion;
mod job;
mod pool;

pub use completion::{Completion, CompletionSender, NoopWaker, UiWaker};
pub use job::FetchJob;
pub use pool::{FetchWorkerPool, Job, PoolError, PoolStats, DEFAULT_FETCH_THREADS, MAX_FETCH_THREADS};
