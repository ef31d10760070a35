//! Map change notifications.

use crate::provider::FetchError;
use crate::tile::TileKey;

/// Receives notifications from a [`TileMap`](super::TileMap).
///
/// Listeners are called on the thread that owns the map, while it applies
/// completions. A typical implementation schedules a repaint.
pub trait TileMapListener {
    /// The bytes for `key` arrived; the tile can be redrawn.
    fn tile_updated(&mut self, key: &TileKey);

    /// The fetch for `key` failed. The tile keeps its placeholder.
    fn tile_failed(&mut self, _key: &TileKey, _error: &FetchError) {}

    /// The number of cached tiles changed.
    fn cache_updated(&mut self, _size: usize, _capacity: usize) {}
}
