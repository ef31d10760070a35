//! Bounded in-memory tile cache with strict LRU eviction.
//!
//! The cache owns every [`PendingImageSlot`] it holds. Slots leave the cache
//! through exactly four doors, and each of them disposes the slot:
//!
//! - eviction when an insertion would exceed the capacity
//! - [`TileCache::remove`] / [`TileCache::remove_slot`]
//! - [`TileCache::clear`]
//! - dropping the cache
//!
//! # Threading
//!
//! All methods take `&mut self` and are meant to be called from the single
//! thread that owns the map (the UI thread). Worker threads never touch the
//! cache; they send completion messages that the owner applies here.

use lru::LruCache;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::cache::CacheStats;
use crate::generation::GenerationCounter;
use crate::tile::{FetchCell, PendingImageSlot, TileKey};

/// Default number of tiles kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Access-ordered map from [`TileKey`] to [`PendingImageSlot`].
///
/// Every hit through [`get`](Self::get) or [`get_or_create`](Self::get_or_create)
/// makes the entry the most recently used. When a new entry would push the
/// size past the capacity, exactly one entry, the least recently used, is
/// evicted first. The entry being inserted is never the victim.
pub struct TileCache<I> {
    /// Unbounded LRU list; the capacity is enforced here so that every
    /// eviction goes through `dispose`.
    entries: LruCache<TileKey, PendingImageSlot<I>>,
    capacity: usize,
    generation: GenerationCounter,
    stats: CacheStats,
}

impl<I> TileCache<I> {
    /// Create a cache holding at most `capacity` tiles (at least one).
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of entries
    /// * `generation` - Counter whose current value stamps new slots
    pub fn new(capacity: usize, generation: GenerationCounter) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: LruCache::unbounded(),
            capacity,
            generation,
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
        }
    }

    /// Look up a slot, making it the most recently used.
    pub fn get(&mut self, key: &TileKey) -> Option<&mut PendingImageSlot<I>> {
        let slot = self.entries.get_mut(key);
        if slot.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        slot
    }

    /// Look up a slot without touching recency order or statistics.
    pub fn peek(&self, key: &TileKey) -> Option<&PendingImageSlot<I>> {
        self.entries.peek(key)
    }

    /// Mutable lookup without touching recency order or statistics.
    pub fn peek_mut(&mut self, key: &TileKey) -> Option<&mut PendingImageSlot<I>> {
        self.entries.peek_mut(key)
    }

    /// Returns the slot for `key`, creating it with `factory` on a miss.
    ///
    /// A hit makes the entry the most recently used. On a miss the factory
    /// receives the key and the current generation stamp; if the cache is
    /// full, the least recently used entry is evicted and disposed before the
    /// new slot goes in.
    pub fn get_or_create<F>(&mut self, key: TileKey, factory: F) -> &mut PendingImageSlot<I>
    where
        F: FnOnce(&TileKey, u64) -> PendingImageSlot<I>,
    {
        if self.entries.contains(&key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            while self.entries.len() >= self.capacity {
                self.evict_lru();
            }
        }

        let stamp = self.generation.current();
        let probe = key.clone();
        self.entries.get_or_insert_mut(key, || {
            trace!(tile = %probe, stamp, "Creating tile slot");
            factory(&probe, stamp)
        })
    }

    /// Remove and dispose the slot for `key`.
    ///
    /// Returns `true` if a slot was resident.
    pub fn remove(&mut self, key: &TileKey) -> bool {
        match self.entries.pop(key) {
            Some(mut slot) => {
                slot.dispose();
                self.stats.removals += 1;
                debug!(tile = %key, "Removed tile slot");
                true
            }
            None => false,
        }
    }

    /// Remove the slot backed by `cell`, if it is still resident.
    ///
    /// A newer slot for the same key (created after the one `cell` belongs
    /// to was evicted) is left alone.
    pub fn remove_slot(&mut self, cell: &Arc<FetchCell>) -> bool {
        if !self.contains_slot(cell) {
            return false;
        }
        self.remove(cell.key())
    }

    /// Returns true if the slot backed by `cell` is resident.
    pub fn contains_slot(&self, cell: &Arc<FetchCell>) -> bool {
        self.entries
            .peek(cell.key())
            .is_some_and(|slot| slot.is_backed_by(cell))
    }

    /// Returns true if any slot for `key` is resident.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains(key)
    }

    /// Dispose and drop every slot.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        while let Some((_, mut slot)) = self.entries.pop_lru() {
            slot.dispose();
        }
        self.stats.removals += count as u64;
        if count > 0 {
            debug!(count, "Cleared tile cache");
        }
    }

    /// Current number of entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The counter used to stamp new slots.
    pub fn generation(&self) -> &GenerationCounter {
        &self.generation
    }

    /// Resident keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<TileKey> {
        self.entries.iter().rev().map(|(key, _)| key.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ..self.stats
        }
    }

    fn evict_lru(&mut self) {
        if let Some((key, mut slot)) = self.entries.pop_lru() {
            let released = slot.dispose();
            self.stats.evictions += 1;
            trace!(tile = %key, released, "Evicted tile slot");
        }
    }
}

impl<I> Drop for TileCache<I> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::texture::{DecodeError, ImageMaterializer};

    fn key(name: &str) -> TileKey {
        TileKey::new(name, 0, 0, 0)
    }

    fn new_slot(key: &TileKey, stamp: u64) -> PendingImageSlot<DropCounter> {
        PendingImageSlot::new(key.clone(), stamp)
    }

    fn insert(cache: &mut TileCache<DropCounter>, name: &str) {
        cache.get_or_create(key(name), new_slot);
    }

    fn resident(cache: &TileCache<DropCounter>) -> Vec<String> {
        cache
            .keys_by_recency()
            .iter()
            .map(|k| k.source_id().to_string())
            .collect()
    }

    /// Image stand-in that counts how often it is dropped.
    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    struct CountingMaterializer(Rc<Cell<usize>>);

    impl ImageMaterializer for CountingMaterializer {
        type Image = DropCounter;

        fn materialize(&self, _key: &TileKey, _bytes: &[u8]) -> Result<DropCounter, DecodeError> {
            Ok(DropCounter(Rc::clone(&self.0)))
        }
    }

    fn materialized(cache: &mut TileCache<DropCounter>, name: &str, drops: &Rc<Cell<usize>>) {
        let slot = cache.get_or_create(key(name), new_slot);
        slot.fetch_cell().publish(Bytes::from_static(b"png"));
        assert!(slot.image(&CountingMaterializer(Rc::clone(drops))).is_some());
    }

    #[test]
    fn test_new_cache() {
        let cache: TileCache<DropCounter> = TileCache::new(2, GenerationCounter::new());
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.size(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache: TileCache<DropCounter> = TileCache::new(0, GenerationCounter::new());
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_insertion_order_eviction() {
        let mut cache = TileCache::new(2, GenerationCounter::new());
        insert(&mut cache, "a");
        insert(&mut cache, "b");
        insert(&mut cache, "c");

        assert_eq!(resident(&cache), vec!["b", "c"]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let mut cache = TileCache::new(2, GenerationCounter::new());
        insert(&mut cache, "a");
        insert(&mut cache, "b");
        assert!(cache.get(&key("a")).is_some());
        insert(&mut cache, "c");

        assert_eq!(resident(&cache), vec!["a", "c"]);
    }

    #[test]
    fn test_get_or_create_hit_promotes() {
        let mut cache = TileCache::new(3, GenerationCounter::new());
        insert(&mut cache, "a");
        insert(&mut cache, "b");
        insert(&mut cache, "c");
        insert(&mut cache, "a");
        insert(&mut cache, "d");

        assert_eq!(resident(&cache), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_reaccessed_first_key_survives_overflow() {
        let capacity = 5;
        let mut cache = TileCache::new(capacity, GenerationCounter::new());
        let names: Vec<String> = (0..=capacity).map(|i| format!("k{i}")).collect();

        for name in &names[..capacity] {
            insert(&mut cache, name);
        }
        cache.get(&key(&names[0]));
        insert(&mut cache, &names[capacity]);

        assert!(cache.contains(&key(&names[0])));
        assert!(!cache.contains(&key(&names[1])));
        assert_eq!(cache.size(), capacity);
    }

    #[test]
    fn test_hit_does_not_call_factory() {
        let mut cache = TileCache::new(2, GenerationCounter::new());
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache.get_or_create(key("a"), |k, s| {
                calls.set(calls.get() + 1);
                new_slot(k, s)
            });
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_factory_receives_current_stamp() {
        let generation = GenerationCounter::new();
        let mut cache: TileCache<DropCounter> = TileCache::new(4, generation.clone());
        generation.advance();
        generation.advance();

        let slot = cache.get_or_create(key("a"), new_slot);
        assert_eq!(slot.stamp(), 2);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = TileCache::new(2, GenerationCounter::new());
        insert(&mut cache, "a");
        insert(&mut cache, "b");
        assert!(cache.peek(&key("a")).is_some());
        insert(&mut cache, "c");

        assert!(!cache.contains(&key("a")));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_get_miss_counts() {
        let mut cache: TileCache<DropCounter> = TileCache::new(2, GenerationCounter::new());
        assert!(cache.get(&key("a")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_eviction_disposes_materialized_image() {
        let drops = Rc::new(Cell::new(0));
        let mut cache = TileCache::new(1, GenerationCounter::new());
        materialized(&mut cache, "a", &drops);
        assert_eq!(drops.get(), 0);

        insert(&mut cache, "b");
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_remove_disposes() {
        let drops = Rc::new(Cell::new(0));
        let mut cache = TileCache::new(4, GenerationCounter::new());
        materialized(&mut cache, "a", &drops);

        assert!(cache.remove(&key("a")));
        assert!(!cache.remove(&key("a")));
        assert_eq!(drops.get(), 1);
        assert_eq!(cache.stats().removals, 1);
    }

    #[test]
    fn test_remove_slot_checks_identity() {
        let mut cache: TileCache<DropCounter> = TileCache::new(4, GenerationCounter::new());
        let old_cell = cache.get_or_create(key("a"), new_slot).fetch_cell();
        cache.remove(&key("a"));
        let new_cell = cache.get_or_create(key("a"), new_slot).fetch_cell();

        assert!(!cache.remove_slot(&old_cell));
        assert!(cache.contains(&key("a")));
        assert!(cache.contains_slot(&new_cell));
        assert!(cache.remove_slot(&new_cell));
        assert!(!cache.contains(&key("a")));
    }

    #[test]
    fn test_clear_and_drop_dispose_each_image_once() {
        let drops = Rc::new(Cell::new(0));
        let mut cache = TileCache::new(4, GenerationCounter::new());
        materialized(&mut cache, "a", &drops);
        materialized(&mut cache, "b", &drops);
        insert(&mut cache, "c");

        cache.clear();
        assert_eq!(drops.get(), 2);
        assert!(cache.is_empty());

        materialized(&mut cache, "d", &drops);
        drop(cache);
        assert_eq!(drops.get(), 3);
    }

    proptest! {
        #[test]
        fn prop_size_never_exceeds_capacity(
            capacity in 1usize..8,
            ops in prop::collection::vec(0u8..16, 1..200),
        ) {
            let mut cache: TileCache<DropCounter> = TileCache::new(capacity, GenerationCounter::new());
            for op in ops {
                cache.get_or_create(TileKey::new("p", op as i32, 0, 0), new_slot);
                prop_assert!(cache.size() <= capacity);
            }
        }

        #[test]
        fn prop_matches_reference_lru(
            capacity in 1usize..6,
            ops in prop::collection::vec((any::<bool>(), 0u8..10), 1..200),
        ) {
            let mut cache: TileCache<DropCounter> = TileCache::new(capacity, GenerationCounter::new());
            // Least recently used at the front.
            let mut model: Vec<u8> = Vec::new();

            for (is_get, id) in ops {
                let k = TileKey::new("p", id as i32, 0, 0);
                if is_get {
                    let hit = cache.get(&k).is_some();
                    let pos = model.iter().position(|&m| m == id);
                    prop_assert_eq!(hit, pos.is_some());
                    if let Some(pos) = pos {
                        let m = model.remove(pos);
                        model.push(m);
                    }
                } else {
                    cache.get_or_create(k, new_slot);
                    if let Some(pos) = model.iter().position(|&m| m == id) {
                        let m = model.remove(pos);
                        model.push(m);
                    } else {
                        if model.len() == capacity {
                            model.remove(0);
                        }
                        model.push(id);
                    }
                }
                let keys: Vec<u8> = cache.keys_by_recency().iter().map(|k| k.x() as u8).collect();
                prop_assert_eq!(&keys, &model);
            }
        }
    }
}
