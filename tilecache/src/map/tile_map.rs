//! The UI-side tile map.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use super::listener::TileMapListener;
use crate::cache::{CacheStats, TileCache};
use crate::executor::{Completion, CompletionSender, FetchJob, FetchWorkerPool, PoolError, PoolStats};
use crate::generation::GenerationCounter;
use crate::provider::{HttpFetcher, TileSource};
use crate::texture::ImageMaterializer;
use crate::tile::{FetchCell, PendingImageSlot, Quadrant, SlotState, TileKey};

/// What the renderer should draw for one tile position.
#[derive(Debug, PartialEq)]
pub enum TileImage<'a, I> {
    /// The tile's own image.
    Exact(&'a I),
    /// The parent tile's image; draw `quadrant` of it scaled up 2×.
    Parent { image: &'a I, quadrant: Quadrant },
    /// Nothing to show yet.
    Placeholder,
    /// The position lies outside the map at the current zoom.
    OutOfBounds,
}

impl<I> TileImage<'_, I> {
    /// Returns true if there is an image to draw.
    pub fn is_drawable(&self) -> bool {
        matches!(self, TileImage::Exact(_) | TileImage::Parent { .. })
    }
}

/// A tile cache bound to one tile source and zoom level.
///
/// `TileMap` lives on the UI thread. It creates slots and queues fetches
/// through [`request_tile`](Self::request_tile), hands out images through
/// [`tile_image`](Self::tile_image), and applies worker results in
/// [`process_completions`](Self::process_completions). Worker threads only
/// ever see the generation counter, the slots' fetch cells and the
/// completion channel.
///
/// Build one with [`TileMap::builder`](super::TileMapBuilder).
pub struct TileMap<M: ImageMaterializer> {
    cache: TileCache<M::Image>,
    materializer: M,
    source: Arc<dyn TileSource>,
    source_id: Arc<str>,
    fetcher: Arc<dyn HttpFetcher>,
    pool: FetchWorkerPool,
    generation: GenerationCounter,
    zoom: u8,
    completions: CompletionSender,
    receiver: Receiver<Completion>,
    listeners: Vec<Box<dyn TileMapListener>>,
    in_flight: usize,
    disposed: bool,
}

impl<M: ImageMaterializer> TileMap<M> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn from_parts(
        cache: TileCache<M::Image>,
        materializer: M,
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn HttpFetcher>,
        pool: FetchWorkerPool,
        zoom: u8,
        completions: CompletionSender,
        receiver: Receiver<Completion>,
        listeners: Vec<Box<dyn TileMapListener>>,
    ) -> Self {
        let generation = cache.generation().clone();
        let zoom = source.clamp_zoom(zoom);
        let source_id = Arc::from(source.id());
        Self {
            cache,
            materializer,
            source,
            source_id,
            fetcher,
            pool,
            generation,
            zoom,
            completions,
            receiver,
            listeners,
            in_flight: 0,
            disposed: false,
        }
    }

    /// Key for tile (`x`, `y`) at the current zoom.
    pub fn key(&self, x: i32, y: i32) -> TileKey {
        TileKey::new(Arc::clone(&self.source_id), x, y, self.zoom)
    }

    /// Make sure tile (`x`, `y`) at the current zoom is cached or being fetched.
    ///
    /// Call this for every visible tile on every repaint; it promotes the
    /// tile in the LRU order. A slot is fetched at most once: a hit on an
    /// existing slot, whatever its state, queues nothing. Tiles outside the
    /// `2^zoom` grid are ignored.
    ///
    /// Returns `true` if a fetch was queued.
    pub fn request_tile(&mut self, x: i32, y: i32) -> Result<bool, PoolError> {
        if self.disposed {
            return Ok(false);
        }
        let key = self.key(x, y);
        if !key.in_bounds() {
            trace!(tile = %key, "Tile outside the map, not requested");
            return Ok(false);
        }

        let turnover = self.turnover();
        let queued = self.queue_fetch(key);
        if self.turnover() != turnover {
            self.notify_cache_updated();
        }
        queued
    }

    fn queue_fetch(&mut self, key: TileKey) -> Result<bool, PoolError> {
        let slot = self
            .cache
            .get_or_create(key, |key, stamp| PendingImageSlot::new(key.clone(), stamp));
        if slot.state() != SlotState::Empty {
            return Ok(false);
        }

        let cell = slot.fetch_cell();
        let url = self.source.tile_url(cell.key());
        let job = FetchJob::new(
            cell,
            url,
            Arc::clone(&self.fetcher),
            self.generation.clone(),
            self.completions.clone(),
        );
        trace!(tile = %slot.key(), url = job.url(), "Queueing tile fetch");
        self.pool.submit(move || job.run())?;
        slot.mark_submitted();
        self.in_flight += 1;
        Ok(true)
    }

    /// Cache size and eviction count, compared before and after a request.
    fn turnover(&self) -> (usize, u64) {
        (self.cache.size(), self.cache.stats().evictions)
    }

    /// Drop tile (`x`, `y`) of the current zoom from the cache.
    ///
    /// The next [`request_tile`](Self::request_tile) for it fetches again,
    /// which is how a failed tile is retried. Returns `true` if the tile was
    /// cached.
    pub fn remove_tile(&mut self, x: i32, y: i32) -> bool {
        let key = self.key(x, y);
        let removed = self.cache.remove(&key);
        if removed {
            self.notify_cache_updated();
        }
        removed
    }

    /// Image to draw at tile (`x`, `y`) of the current zoom.
    ///
    /// Materializes the image on first access. Falls back to the covering
    /// tile one zoom level up when the exact tile has no image yet. Does not
    /// change the LRU order and does not queue fetches.
    pub fn tile_image(&mut self, x: i32, y: i32) -> TileImage<'_, M::Image> {
        let key = self.key(x, y);
        if !key.in_bounds() {
            return TileImage::OutOfBounds;
        }

        if self.materialize(&key) {
            return match self.cached_image(&key) {
                Some(image) => TileImage::Exact(image),
                None => TileImage::Placeholder,
            };
        }

        let parent = match key.parent() {
            Some(parent) => parent,
            None => return TileImage::Placeholder,
        };
        if !self.materialize(&parent) {
            return TileImage::Placeholder;
        }
        match self.cached_image(&parent) {
            Some(image) => TileImage::Parent {
                image,
                quadrant: key.quadrant(),
            },
            None => TileImage::Placeholder,
        }
    }

    fn materialize(&mut self, key: &TileKey) -> bool {
        match self.cache.peek_mut(key) {
            Some(slot) => slot.image(&self.materializer).is_some(),
            None => false,
        }
    }

    fn cached_image(&self, key: &TileKey) -> Option<&M::Image> {
        self.cache.peek(key).and_then(|slot| slot.cached_image())
    }

    /// Switch to zoom level `zoom`, clamped to the source's range.
    ///
    /// Advances the generation counter if the zoom actually changed, which
    /// turns every fetch still in flight into stale work. Returns the
    /// effective zoom.
    pub fn set_zoom(&mut self, zoom: u8) -> u8 {
        let zoom = self.source.clamp_zoom(zoom);
        if zoom != self.zoom {
            let generation = self.generation.advance();
            debug!(from = self.zoom, to = zoom, generation, "Zoom changed");
            self.zoom = zoom;
        }
        self.zoom
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Replace the tile source.
    ///
    /// Every cached tile belongs to the old source, so the cache is cleared.
    /// Fetches still in flight complete against slots that no longer exist
    /// and are ignored. The zoom is clamped to the new source's range.
    pub fn set_source(&mut self, source: Arc<dyn TileSource>) {
        info!(from = self.source.id(), to = source.id(), "Switching tile source");
        self.cache.clear();
        self.source_id = Arc::from(source.id());
        self.source = source;
        self.set_zoom(self.zoom);
        self.notify_cache_updated();
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    /// Apply every completion that has already arrived. Never blocks.
    ///
    /// Returns the number of completions applied.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Block up to `timeout` for a completion, then apply it and any others
    /// already queued.
    ///
    /// Returns the number of completions applied, 0 on timeout.
    pub fn wait_for_completions(&mut self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply(completion);
                1 + self.process_completions()
            }
            Err(_) => 0,
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.cache.contains_slot(completion.cell()) {
            trace!(tile = %completion.key(), "Completion for a slot that is no longer cached");
            return;
        }

        match completion {
            Completion::Filled { cell } => {
                for listener in self.listeners.iter_mut() {
                    listener.tile_updated(cell.key());
                }
            }
            Completion::Stale { cell } => self.remove_stale(&cell),
            Completion::Failed { cell, error } => {
                for listener in self.listeners.iter_mut() {
                    listener.tile_failed(cell.key(), &error);
                }
            }
        }
    }

    fn remove_stale(&mut self, cell: &Arc<FetchCell>) {
        if self.cache.remove_slot(cell) {
            debug!(tile = %cell.key(), stamp = cell.stamp(), "Removed stale tile slot");
            self.notify_cache_updated();
        }
    }

    fn notify_cache_updated(&mut self) {
        let size = self.cache.size();
        let capacity = self.cache.capacity();
        for listener in self.listeners.iter_mut() {
            listener.cache_updated(size, capacity);
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn TileMapListener>) {
        self.listeners.push(listener);
    }

    /// Fetches queued whose completion has not been applied yet.
    pub fn pending_fetches(&self) -> usize {
        self.in_flight
    }

    pub fn cache(&self) -> &TileCache<M::Image> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The counter advanced on every zoom change.
    pub fn generation(&self) -> &GenerationCounter {
        &self.generation
    }

    /// Release every cached tile. The map requests nothing afterwards.
    ///
    /// Calling this more than once is harmless. Dropping the map has the
    /// same effect.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pool.close();
        self.cache.clear();
        debug!(source = self.source.id(), "Tile map disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
