//! Cache statistics.

use std::fmt;

/// Point-in-time counters for a [`TileCache`](super::TileCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a resident slot.
    pub hits: u64,
    /// Lookups that found nothing (including those that then created a slot).
    pub misses: u64,
    /// Slots dropped because the cache was over capacity.
    pub evictions: u64,
    /// Slots dropped by explicit removal (stale fetches, `remove`).
    pub removals: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups that were hits, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} tiles, {} hits, {} misses ({:.1}% hit rate), {} evicted, {} removed",
            self.size,
            self.capacity,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.removals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        let stats = CacheStats {
            hits: 1,
            misses: 1,
            evictions: 2,
            removals: 3,
            size: 4,
            capacity: 5,
        };
        let display = stats.to_string();
        assert!(display.contains("4/5 tiles"));
        assert!(display.contains("50.0% hit rate"));
        assert!(display.contains("2 evicted"));
        assert!(display.contains("3 removed"));
    }
}
