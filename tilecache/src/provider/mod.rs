//! Tile source and network fetch abstraction
//!
//! This module provides the two collaborators a fetch job needs:
//! - [`TileSource`]: builds the URL for a tile key and declares the zoom range
//! - [`HttpFetcher`]: performs the blocking network fetch
//!
//! ```ignore
//! use tilecache::provider::{HttpFetcher, ReqwestFetcher, TileSource, UrlTemplateSource};
//!
//! let fetcher = ReqwestFetcher::new()?;
//! let source = UrlTemplateSource::openstreetmap();
//! let bytes = fetcher.get(&source.tile_url(&key))?;
//! ```

mod http;
mod source;
mod types;

pub use http::{HttpFetcher, ReqwestFetcher, DEFAULT_FETCH_TIMEOUT_SECS};
pub use source::{TileSource, UrlTemplateSource, DEFAULT_URL_TEMPLATE};
pub use types::FetchError;

#[cfg(test)]
pub use http::tests::MockHttpFetcher;
