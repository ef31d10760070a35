//! Image materialization for fetched tiles.
//!
//! Fetch jobs only ever produce raw bytes. Turning those bytes into an image
//! happens lazily on the thread that owns the cache, through an
//! [`ImageMaterializer`]. Toolkits whose image handles are confined to one
//! thread plug in their own materializer; [`RasterMaterializer`] decodes into
//! an in-memory RGBA buffer with the `image` crate.
//!
//! # Example
//!
//! ```
//! use tilecache::texture::{ImageMaterializer, RasterMaterializer};
//! use tilecache::tile::TileKey;
//!
//! let materializer = RasterMaterializer::new();
//! let key = TileKey::new("osm", 0, 0, 0);
//! assert!(materializer.materialize(&key, b"not an image").is_err());
//! ```

mod error;

pub use error::DecodeError;

use image::RgbaImage;

use crate::tile::{TileKey, TILE_SIZE};

/// Converts fetched tile bytes into a displayable image.
///
/// Called at most once per slot, never from a worker thread. Dropping the
/// returned image must release any resources it holds; the cache drops images
/// exactly once, on eviction, removal or teardown.
pub trait ImageMaterializer {
    /// The image type produced, e.g. a toolkit-native handle.
    type Image;

    /// Decode `bytes` fetched for `key`.
    fn materialize(&self, key: &TileKey, bytes: &[u8]) -> Result<Self::Image, DecodeError>;
}

/// Decodes tiles into RGBA pixel buffers.
#[derive(Debug, Clone)]
pub struct RasterMaterializer {
    /// Required edge length, or `None` to accept any size.
    expected_size: Option<u32>,
}

impl RasterMaterializer {
    /// Create a materializer that accepts images of any size.
    pub fn new() -> Self {
        Self {
            expected_size: None,
        }
    }

    /// Create a materializer that rejects tiles that are not `size`×`size`.
    pub fn with_tile_size(size: u32) -> Self {
        Self {
            expected_size: Some(size),
        }
    }

    /// Create a materializer that requires standard 256×256 tiles.
    pub fn standard() -> Self {
        Self::with_tile_size(TILE_SIZE)
    }
}

impl Default for RasterMaterializer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMaterializer for RasterMaterializer {
    type Image = RgbaImage;

    fn materialize(&self, _key: &TileKey, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?.into_rgba8();

        if let Some(expected) = self.expected_size {
            if decoded.width() != expected || decoded.height() != expected {
                return Err(DecodeError::InvalidDimensions {
                    width: decoded.width(),
                    height: decoded.height(),
                    expected,
                });
            }
        }

        Ok(decoded)
    }
}
