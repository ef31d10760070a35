//! The background fetch job for one tile slot.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use super::completion::{Completion, CompletionSender};
use super::pool::panic_message;
use crate::generation::GenerationCounter;
use crate::provider::{FetchError, HttpFetcher};
use crate::tile::FetchCell;

/// Fetches the bytes for one slot and reports the outcome to the UI thread.
///
/// The generation stamp is checked twice: before the request, so stale work
/// never touches the network, and after it, so bytes fetched for an old zoom
/// level are never published.
pub struct FetchJob {
    cell: Arc<FetchCell>,
    url: String,
    fetcher: Arc<dyn HttpFetcher>,
    generation: GenerationCounter,
    completions: CompletionSender,
}

impl FetchJob {
    pub fn new(
        cell: Arc<FetchCell>,
        url: String,
        fetcher: Arc<dyn HttpFetcher>,
        generation: GenerationCounter,
        completions: CompletionSender,
    ) -> Self {
        Self {
            cell,
            url,
            fetcher,
            generation,
            completions,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run the job to completion on the current thread.
    ///
    /// Never panics because of the fetcher; every outcome becomes exactly one
    /// completion message.
    pub fn run(self) {
        let completion = self.execute();
        self.completions.deliver(completion);
    }

    fn execute(&self) -> Completion {
        let key = self.cell.key();
        let stamp = self.cell.stamp();

        if self.generation.is_stale(stamp) {
            debug!(tile = %key, stamp, "Zoom changed before fetch, skipping");
            return self.stale();
        }

        trace!(tile = %key, url = %self.url, "Fetching tile");
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.fetcher.get(&self.url))) {
            Ok(Ok(body)) if body.is_empty() => Err(FetchError::EmptyBody(self.url.clone())),
            Ok(result) => result,
            Err(payload) => Err(FetchError::Panicked(panic_message(&payload))),
        };

        if self.generation.is_stale(stamp) {
            debug!(tile = %key, stamp, "Zoom changed during fetch, discarding result");
            return self.stale();
        }

        match result {
            Ok(body) => {
                let size = body.len();
                if self.cell.publish(Bytes::from(body)) {
                    trace!(tile = %key, size, "Tile bytes published");
                } else {
                    warn!(tile = %key, "Tile bytes were already published, keeping the first");
                }
                Completion::Filled {
                    cell: Arc::clone(&self.cell),
                }
            }
            Err(error) => {
                warn!(tile = %key, url = %self.url, error = %error, "Tile fetch failed");
                self.cell.mark_failed();
                Completion::Failed {
                    cell: Arc::clone(&self.cell),
                    error,
                }
            }
        }
    }

    fn stale(&self) -> Completion {
        Completion::Stale {
            cell: Arc::clone(&self.cell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::NoopWaker;
    use crate::provider::MockHttpFetcher;
    use crate::tile::{PendingImageSlot, SlotState, TileKey};
    use std::sync::mpsc::{channel, Receiver};

    struct PanickingFetcher;

    impl HttpFetcher for PanickingFetcher {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            panic!("fetcher exploded");
        }
    }

    /// Fetcher that advances the generation while "on the network".
    struct ZoomingFetcher(GenerationCounter);

    impl HttpFetcher for ZoomingFetcher {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.0.advance();
            Ok(b"late".to_vec())
        }
    }

    fn setup(
        fetcher: Arc<dyn HttpFetcher>,
        generation: &GenerationCounter,
    ) -> (PendingImageSlot<()>, FetchJob, Receiver<Completion>) {
        let slot = PendingImageSlot::new(TileKey::new("t", 3, 4, 5), generation.current());
        let (tx, rx) = channel();
        let job = FetchJob::new(
            slot.fetch_cell(),
            "http://tiles.test/5/3/4.png".to_string(),
            fetcher,
            generation.clone(),
            CompletionSender::new(tx, Arc::new(NoopWaker)),
        );
        (slot, job, rx)
    }

    #[test]
    fn test_success_publishes_bytes() {
        let generation = GenerationCounter::new();
        let fetcher = Arc::new(MockHttpFetcher::ok(b"png"));
        let (slot, job, rx) = setup(fetcher.clone(), &generation);

        job.run();

        assert!(matches!(rx.try_recv().unwrap(), Completion::Filled { .. }));
        assert_eq!(slot.raw_bytes().unwrap().as_ref(), b"png");
        assert_eq!(fetcher.requests.lock()[0], "http://tiles.test/5/3/4.png");
    }

    #[test]
    fn test_stale_before_fetch_skips_network() {
        let generation = GenerationCounter::new();
        let fetcher = Arc::new(MockHttpFetcher::ok(b"png"));
        let (slot, job, rx) = setup(fetcher.clone(), &generation);
        generation.advance();

        job.run();

        assert!(matches!(rx.try_recv().unwrap(), Completion::Stale { .. }));
        assert_eq!(fetcher.request_count(), 0);
        assert!(slot.raw_bytes().is_none());
    }

    #[test]
    fn test_stale_after_fetch_is_not_published() {
        let generation = GenerationCounter::new();
        let fetcher = Arc::new(ZoomingFetcher(generation.clone()));
        let (slot, job, rx) = setup(fetcher, &generation);

        job.run();

        assert!(matches!(rx.try_recv().unwrap(), Completion::Stale { .. }));
        assert!(slot.raw_bytes().is_none());
    }

    #[test]
    fn test_fetch_error_marks_failed() {
        let generation = GenerationCounter::new();
        let fetcher = Arc::new(MockHttpFetcher::failing(FetchError::Http("down".into())));
        let (mut slot, job, rx) = setup(fetcher, &generation);
        slot.mark_submitted();

        job.run();

        match rx.try_recv().unwrap() {
            Completion::Failed { error, .. } => assert_eq!(error, FetchError::Http("down".into())),
            other => panic!("unexpected completion: {:?}", other),
        }
        assert_eq!(slot.state(), SlotState::Failed);
    }

    #[test]
    fn test_empty_body_is_an_error() {
        let generation = GenerationCounter::new();
        let (slot, job, rx) = setup(Arc::new(MockHttpFetcher::ok(b"")), &generation);

        job.run();

        assert!(matches!(
            rx.try_recv().unwrap(),
            Completion::Failed {
                error: FetchError::EmptyBody(_),
                ..
            }
        ));
        assert!(slot.raw_bytes().is_none());
    }

    #[test]
    fn test_panicking_fetcher_is_caught() {
        let generation = GenerationCounter::new();
        let (slot, job, rx) = setup(Arc::new(PanickingFetcher), &generation);

        job.run();

        match rx.try_recv().unwrap() {
            Completion::Failed { error, .. } => {
                assert_eq!(error, FetchError::Panicked("fetcher exploded".into()))
            }
            other => panic!("unexpected completion: {:?}", other),
        }
        assert!(slot.fetch_cell().has_failed());
    }

    #[test]
    fn test_undeliverable_completion_is_dropped() {
        let generation = GenerationCounter::new();
        let (slot, job, rx) = setup(Arc::new(MockHttpFetcher::ok(b"png")), &generation);
        drop(rx);

        job.run();

        assert!(slot.raw_bytes().is_some());
    }
}
