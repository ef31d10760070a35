//! Tile cache.
//!
//! [`TileCache`] is a bounded, access-ordered map from tile keys to pending
//! image slots. It evicts the single least recently used slot when an
//! insertion would exceed its capacity and disposes whatever image the
//! evicted slot had materialized.
//!
//! # Example
//!
//! ```
//! use tilecache::cache::TileCache;
//! use tilecache::generation::GenerationCounter;
//! use tilecache::tile::{PendingImageSlot, TileKey};
//!
//! let mut cache: TileCache<Vec<u8>> = TileCache::new(2, GenerationCounter::new());
//! for name in ["a", "b", "c"] {
//!     cache.get_or_create(TileKey::new(name, 0, 0, 0), |key, stamp| {
//!         PendingImageSlot::new(key.clone(), stamp)
//!     });
//! }
//!
//! assert_eq!(cache.size(), 2);
//! assert!(!cache.contains(&TileKey::new("a", 0, 0, 0)));
//! ```

mod memory;
mod stats;

pub use memory::{TileCache, DEFAULT_CACHE_CAPACITY};
pub use stats::CacheStats;
