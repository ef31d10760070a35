//! Tile identity and per-tile fetch state.
//!
//! - [`TileKey`] addresses one tile of one source at one zoom level.
//! - [`PendingImageSlot`] tracks one tile from cache miss to eviction.
//! - [`FetchCell`] is the part of a slot shared with its background fetch.

mod key;
mod slot;

pub use key::{Quadrant, TileKey};
pub use slot::{FetchCell, PendingImageSlot, SlotState};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;
