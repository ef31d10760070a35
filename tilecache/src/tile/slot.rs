//! Pending tile image slots.
//!
//! A [`PendingImageSlot`] is the cache's view of one tile fetch. It is split in
//! two halves:
//!
//! - [`FetchCell`] is shared (`Arc`) with the background fetch job. It holds the
//!   immutable key and generation stamp plus the write-once raw byte buffer.
//! - The slot itself owns the decoded image, which is created lazily and only
//!   ever touched by the thread that owns the cache.
//!
//! ```text
//!   UI thread                          worker thread
//! ┌────────────────────────┐         ┌───────────────┐
//! │ PendingImageSlot       │         │   FetchJob    │
//! │  image: Option<I>      │         │               │
//! │  cell ─────────┐       │         │  cell ──┐     │
//! └────────────────┼───────┘         └─────────┼─────┘
//!                  ▼                           ▼
//!            ┌──────────────────────────────────────┐
//!            │ FetchCell { key, stamp, OnceLock }   │
//!            └──────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tracing::{trace, warn};

use crate::texture::ImageMaterializer;
use crate::tile::TileKey;

/// State shared between a slot and the worker fetching its bytes.
///
/// The byte buffer is published at most once. Readers observe either nothing
/// or the complete buffer.
pub struct FetchCell {
    key: TileKey,
    stamp: u64,
    bytes: OnceLock<Bytes>,
    failed: AtomicBool,
}

impl FetchCell {
    fn new(key: TileKey, stamp: u64) -> Self {
        Self {
            key,
            stamp,
            bytes: OnceLock::new(),
            failed: AtomicBool::new(false),
        }
    }

    /// The tile this cell belongs to.
    pub fn key(&self) -> &TileKey {
        &self.key
    }

    /// Generation stamp captured when the slot was created.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// The fetched bytes, if they have been published.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.bytes.get()
    }

    /// Returns true once a fetch for this cell has failed.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Publish the fetched bytes.
    ///
    /// Returns `false` if bytes were already published; the first buffer wins.
    pub(crate) fn publish(&self, bytes: Bytes) -> bool {
        self.bytes.set(bytes).is_ok()
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for FetchCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCell")
            .field("key", &self.key)
            .field("stamp", &self.stamp)
            .field("bytes", &self.bytes.get().map(|b| b.len()))
            .field("failed", &self.has_failed())
            .finish()
    }
}

/// Lifecycle state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Created, no fetch submitted yet.
    Empty,
    /// Fetch submitted, no result yet.
    Fetching,
    /// Bytes published by the fetch job.
    Filled,
    /// The fetch failed; the slot stays empty for the rest of its life.
    Failed,
    /// Resources released by eviction, removal or teardown.
    Disposed,
}

/// One tile's image data, from cache miss to eviction.
///
/// Image accessors must only be called by the thread that owns the cache.
/// The `TileCache` is the only owner of slots, so this holds as long as the
/// cache itself is not shared.
pub struct PendingImageSlot<I> {
    cell: Arc<FetchCell>,
    image: Option<I>,
    submitted: bool,
    decode_failed: bool,
    disposed: bool,
}

impl<I> PendingImageSlot<I> {
    /// Create an empty slot for `key` stamped with generation `stamp`.
    pub fn new(key: TileKey, stamp: u64) -> Self {
        Self {
            cell: Arc::new(FetchCell::new(key, stamp)),
            image: None,
            submitted: false,
            decode_failed: false,
            disposed: false,
        }
    }

    pub fn key(&self) -> &TileKey {
        self.cell.key()
    }

    pub fn stamp(&self) -> u64 {
        self.cell.stamp()
    }

    /// Handle to the shared half of the slot, given to the fetch job.
    pub fn fetch_cell(&self) -> Arc<FetchCell> {
        Arc::clone(&self.cell)
    }

    /// Returns true if `cell` is this slot's fetch cell.
    pub fn is_backed_by(&self, cell: &Arc<FetchCell>) -> bool {
        Arc::ptr_eq(&self.cell, cell)
    }

    /// Record that a fetch job was queued for this slot.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    /// The raw fetched bytes, if published and not yet disposed.
    pub fn raw_bytes(&self) -> Option<&Bytes> {
        if self.disposed {
            return None;
        }
        self.cell.bytes()
    }

    pub fn state(&self) -> SlotState {
        if self.disposed {
            SlotState::Disposed
        } else if self.cell.bytes().is_some() {
            SlotState::Filled
        } else if self.cell.has_failed() {
            SlotState::Failed
        } else if self.submitted {
            SlotState::Fetching
        } else {
            SlotState::Empty
        }
    }

    /// Returns true if the bytes arrived but could not be decoded.
    pub fn decode_failed(&self) -> bool {
        self.decode_failed
    }

    /// Returns true if the image has already been materialized.
    pub fn is_materialized(&self) -> bool {
        self.image.is_some()
    }

    /// The image, materializing it from the raw bytes on first access.
    ///
    /// Returns `None` while the bytes are missing (the caller paints a
    /// placeholder), after a decode failure, and after disposal. A decode
    /// failure is not retried.
    pub fn image<M>(&mut self, materializer: &M) -> Option<&I>
    where
        M: ImageMaterializer<Image = I> + ?Sized,
    {
        if self.disposed {
            return None;
        }
        if self.image.is_none() && !self.decode_failed {
            let bytes = self.cell.bytes()?.clone();
            match materializer.materialize(self.cell.key(), &bytes) {
                Ok(image) => {
                    trace!(tile = %self.cell.key(), size = bytes.len(), "Materialized tile image");
                    self.image = Some(image);
                }
                Err(e) => {
                    warn!(tile = %self.cell.key(), error = %e, "Failed to decode tile image");
                    self.decode_failed = true;
                }
            }
        }
        self.image.as_ref()
    }

    /// The already materialized image, without decoding.
    pub fn cached_image(&self) -> Option<&I> {
        self.image.as_ref()
    }

    /// Release the decoded image and stop exposing the raw bytes.
    ///
    /// Safe to call any number of times. Returns `true` only on the call that
    /// actually released a materialized image.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.image.take().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<I> fmt::Debug for PendingImageSlot<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingImageSlot")
            .field("key", self.key())
            .field("stamp", &self.stamp())
            .field("state", &self.state())
            .field("materialized", &self.image.is_some())
            .finish()
    }
}
