//! Settings structs for each configuration section.
//!
//! Each struct represents one `[section]` of the INI config file.

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::executor::{DEFAULT_FETCH_THREADS, MAX_FETCH_THREADS};
use crate::provider::{UrlTemplateSource, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_URL_TEMPLATE};

/// Default tile source identifier.
pub const DEFAULT_SOURCE_ID: &str = "osm";

/// Default minimum zoom level.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Default maximum zoom level.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCacheConfig {
    /// In-memory tile cache settings
    pub cache: CacheSettings,
    /// Fetch worker settings
    pub fetch: FetchSettings,
    /// Tile source settings
    pub source: SourceSettings,
}

impl TileCacheConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity.max(1);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.fetch.threads = clamp_threads(threads);
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.fetch.timeout_secs = timeout_secs;
        self
    }

    pub fn with_source(mut self, source: SourceSettings) -> Self {
        self.source = source;
        self
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of tiles held in memory
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Number of background fetch threads (1 to 16)
    pub threads: usize,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_FETCH_THREADS,
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Identifier stored in tile keys
    pub id: String,
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{s}`
    pub url_template: String,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            id: DEFAULT_SOURCE_ID.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl SourceSettings {
    /// Settings matching a built-in source.
    pub fn from_preset(source: &UrlTemplateSource) -> Self {
        use crate::provider::TileSource;

        Self {
            id: source.id().to_string(),
            url_template: source.template().to_string(),
            subdomains: source.subdomains().to_vec(),
            min_zoom: source.min_zoom(),
            max_zoom: source.max_zoom(),
        }
    }

    /// Build the tile source these settings describe.
    pub fn to_source(&self) -> UrlTemplateSource {
        UrlTemplateSource::new(self.id.clone(), self.url_template.clone())
            .with_subdomains(self.subdomains.iter().cloned())
            .with_zoom_range(self.min_zoom, self.max_zoom)
    }
}

/// Clamp a worker count into the supported range.
pub fn clamp_threads(threads: usize) -> usize {
    threads.clamp(1, MAX_FETCH_THREADS)
}
