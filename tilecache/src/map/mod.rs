//! The UI-thread façade over cache, worker pool and tile source.
//!
//! A renderer drives a [`TileMap`] in three steps per frame:
//!
//! 1. [`TileMap::process_completions`] applies finished fetches
//! 2. [`TileMap::request_tile`] for every visible tile
//! 3. [`TileMap::tile_image`] to get what to draw
//!
//! Listeners are told when a tile can be redrawn.

mod builder;
mod listener;
mod tile_map;

pub use builder::TileMapBuilder;
pub use listener::TileMapListener;
pub use tile_map::{TileImage, TileMap};
