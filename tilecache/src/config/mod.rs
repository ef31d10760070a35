//! Configuration loaded from `~/.tilecache/config.ini`.
//!
//! ```ini
//! [cache]
//! capacity = 256
//!
//! [fetch]
//! threads = 4
//! timeout = 30
//!
//! [source]
//! id = osm
//! url = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! ```
//!
//! Missing files and missing keys fall back to defaults; malformed values
//! are reported as [`ConfigError::InvalidValue`].
//!
//! # Example
//!
//! ```
//! use tilecache::config::TileCacheConfig;
//! use tilecache::provider::TileSource;
//!
//! let config = TileCacheConfig::default().with_capacity(512).with_threads(8);
//! assert_eq!(config.cache.capacity, 512);
//! assert_eq!(config.source.to_source().max_zoom(), 19);
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigError};
pub use settings::{
    clamp_threads, CacheSettings, FetchSettings, SourceSettings, TileCacheConfig,
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_SOURCE_ID,
};
