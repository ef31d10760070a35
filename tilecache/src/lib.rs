//! tilecache - bounded tile cache with background fetching for map viewers
//!
//! A map renderer asks for tile images on its UI thread while a small pool of
//! worker threads downloads missing tiles. The library keeps the two sides
//! apart:
//!
//! - [`cache::TileCache`] holds at most `capacity` tiles and evicts the least
//!   recently used one when full, releasing its image right away.
//! - [`executor::FetchWorkerPool`] runs blocking downloads; workers only
//!   publish raw bytes and send completion messages.
//! - [`generation::GenerationCounter`] is advanced on every zoom change, so
//!   downloads started for an old zoom level are discarded instead of filling
//!   the cache.
//! - [`map::TileMap`] ties these together for the UI thread and decodes
//!   images lazily through an [`texture::ImageMaterializer`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tilecache::map::{TileImage, TileMap};
//! use tilecache::provider::{ReqwestFetcher, UrlTemplateSource};
//! use tilecache::texture::RasterMaterializer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut map = TileMap::builder(
//!     Arc::new(UrlTemplateSource::openstreetmap()),
//!     Arc::new(ReqwestFetcher::new()?),
//!     RasterMaterializer::standard(),
//! )
//! .zoom(2)
//! .build()?;
//!
//! map.request_tile(1, 1)?;
//! map.wait_for_completions(Duration::from_secs(10));
//! if let TileImage::Exact(image) = map.tile_image(1, 1) {
//!     println!("{}x{}", image.width(), image.height());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod executor;
pub mod generation;
pub mod logging;
pub mod map;
pub mod provider;
pub mod texture;
pub mod tile;
