//! Builder for [`TileMap`].

use std::sync::mpsc;
use std::sync::Arc;

use tracing::info;

use super::listener::TileMapListener;
use super::tile_map::TileMap;
use crate::cache::{TileCache, DEFAULT_CACHE_CAPACITY};
use crate::config::TileCacheConfig;
use crate::executor::{
    CompletionSender, FetchWorkerPool, NoopWaker, PoolError, UiWaker, DEFAULT_FETCH_THREADS,
};
use crate::generation::GenerationCounter;
use crate::provider::{HttpFetcher, TileSource};
use crate::texture::ImageMaterializer;

/// Configures and starts a [`TileMap`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tilecache::map::TileMap;
/// use tilecache::provider::{ReqwestFetcher, UrlTemplateSource};
/// use tilecache::texture::RasterMaterializer;
///
/// let map = TileMap::builder(
///     Arc::new(UrlTemplateSource::openstreetmap()),
///     Arc::new(ReqwestFetcher::new().unwrap()),
///     RasterMaterializer::standard(),
/// )
/// .capacity(512)
/// .threads(6)
/// .zoom(3)
/// .build()
/// .unwrap();
/// assert_eq!(map.zoom(), 3);
/// ```
pub struct TileMapBuilder<M> {
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn HttpFetcher>,
    materializer: M,
    capacity: usize,
    threads: usize,
    zoom: u8,
    waker: Arc<dyn UiWaker>,
    listeners: Vec<Box<dyn TileMapListener>>,
}

impl<M: ImageMaterializer> TileMap<M> {
    /// Start building a map over `source`.
    pub fn builder(
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn HttpFetcher>,
        materializer: M,
    ) -> TileMapBuilder<M> {
        TileMapBuilder {
            zoom: source.min_zoom(),
            source,
            fetcher,
            materializer,
            capacity: DEFAULT_CACHE_CAPACITY,
            threads: DEFAULT_FETCH_THREADS,
            waker: Arc::new(NoopWaker),
            listeners: Vec::new(),
        }
    }
}

impl<M: ImageMaterializer> TileMapBuilder<M> {
    /// Maximum number of cached tiles.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Number of fetch worker threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Initial zoom level, clamped to the source's range.
    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Called from worker threads after each completion is queued.
    pub fn waker(mut self, waker: Arc<dyn UiWaker>) -> Self {
        self.waker = waker;
        self
    }

    pub fn listener(mut self, listener: Box<dyn TileMapListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Take capacity and thread count from a loaded configuration.
    pub fn with_config(self, config: &TileCacheConfig) -> Self {
        self.capacity(config.cache.capacity)
            .threads(config.fetch.threads)
    }

    /// Start the worker pool and create the map.
    pub fn build(self) -> Result<TileMap<M>, PoolError> {
        let pool = FetchWorkerPool::new(self.threads)?;
        let cache = TileCache::new(self.capacity, GenerationCounter::new());
        let (sender, receiver) = mpsc::channel();

        info!(
            source = self.source.id(),
            capacity = cache.capacity(),
            threads = pool.threads(),
            "Tile map created"
        );

        Ok(TileMap::from_parts(
            cache,
            self.materializer,
            self.source,
            self.fetcher,
            pool,
            self.zoom,
            CompletionSender::new(sender, self.waker),
            receiver,
            self.listeners,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MAX_FETCH_THREADS;
    use crate::provider::{MockHttpFetcher, UrlTemplateSource};
    use crate::texture::RasterMaterializer;

    fn builder() -> TileMapBuilder<RasterMaterializer> {
        TileMap::builder(
            Arc::new(UrlTemplateSource::new("t", "{z}/{x}/{y}").with_zoom_range(2, 12)),
            Arc::new(MockHttpFetcher::ok(b"x")),
            RasterMaterializer::new(),
        )
    }

    #[test]
    fn test_defaults() {
        let map = builder().build().unwrap();
        assert_eq!(map.cache().capacity(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(map.pool_stats().threads, DEFAULT_FETCH_THREADS);
        assert_eq!(map.zoom(), 2);
    }

    #[test]
    fn test_settings_are_applied_and_clamped() {
        let map = builder().capacity(0).threads(64).zoom(30).build().unwrap();
        assert_eq!(map.cache().capacity(), 1);
        assert_eq!(map.pool_stats().threads, MAX_FETCH_THREADS);
        assert_eq!(map.zoom(), 12);
    }

    #[test]
    fn test_with_config() {
        let mut config = TileCacheConfig::default();
        config.cache.capacity = 32;
        config.fetch.threads = 2;

        let map = builder().with_config(&config).build().unwrap();
        assert_eq!(map.cache().capacity(), 32);
        assert_eq!(map.pool_stats().threads, 2);
    }
}
