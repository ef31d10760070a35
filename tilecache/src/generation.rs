//! Zoom generation counter.
//!
//! Every zoom change advances the counter. Slots capture the value when they
//! are created, and fetch jobs compare that stamp against the live counter to
//! decide whether their result is still wanted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, monotonically increasing 64-bit generation counter.
///
/// Cloning produces another handle to the same counter. Each map owns its
/// own counter; handles are passed explicitly to the jobs that need them.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    value: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advance to the next generation and return it.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns true if `stamp` is no longer the current generation.
    pub fn is_stale(&self, stamp: u64) -> bool {
        stamp != self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(GenerationCounter::new().current(), 0);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let counter = GenerationCounter::new();
        let handle = counter.clone();
        counter.advance();
        assert_eq!(handle.current(), 1);
        assert!(handle.is_stale(0));
        assert!(!handle.is_stale(1));
    }

    #[test]
    fn test_concurrent_advances_are_not_lost() {
        let counter = GenerationCounter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.current(), 8000);
    }
}
