//! Tile identity.
//!
//! Provides the `TileKey` type used as the cache key for every tile slot.

use std::fmt;
use std::sync::Arc;

/// Identifier of one tile from one tile source.
///
/// Equality and hashing are structural over all four fields, so two keys
/// built from the same source id and coordinates always address the same
/// cache entry.
///
/// # Note
///
/// `x` and `y` are signed because the viewport may address tiles outside
/// the `[0, 2^zoom)` grid while panning past the map edge. Such keys are
/// valid values but are never fetched (see [`TileKey::in_bounds`]).
///
/// # Example
///
/// ```
/// use tilecache::tile::TileKey;
///
/// let key = TileKey::new("osm", 8583, 5735, 14);
/// assert_eq!(key.x(), 8583);
/// assert_eq!(key.y(), 5735);
/// assert_eq!(key.zoom(), 14);
/// assert!(key.in_bounds());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Tile source identifier (shared, keys are cloned on every lookup)
    source_id: Arc<str>,
    /// Tile column
    x: i32,
    /// Tile row
    y: i32,
    /// Zoom level
    zoom: u8,
}

impl TileKey {
    /// Create a new tile key.
    ///
    /// # Arguments
    ///
    /// * `source_id` - Identifier of the tile source the tile comes from
    /// * `x` - Tile column (west to east)
    /// * `y` - Tile row (north to south)
    /// * `zoom` - Zoom level
    pub fn new(source_id: impl Into<Arc<str>>, x: i32, y: i32, zoom: u8) -> Self {
        Self {
            source_id: source_id.into(),
            x,
            y,
            zoom,
        }
    }

    /// Get the tile source identifier.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Get the tile column.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Get the tile row.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Get the zoom level.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Number of tiles along one axis at this key's zoom level.
    pub fn grid_size(&self) -> i64 {
        1i64 << self.zoom.min(62)
    }

    /// Returns true if the tile lies inside the `2^zoom × 2^zoom` grid.
    pub fn in_bounds(&self) -> bool {
        let n = self.grid_size();
        (0..n).contains(&(self.x as i64)) && (0..n).contains(&(self.y as i64))
    }

    /// Key of the tile one zoom level up that covers this tile.
    ///
    /// Returns `None` at zoom 0.
    pub fn parent(&self) -> Option<TileKey> {
        if self.zoom == 0 {
            return None;
        }
        Some(Self {
            source_id: Arc::clone(&self.source_id),
            x: self.x.div_euclid(2),
            y: self.y.div_euclid(2),
            zoom: self.zoom - 1,
        })
    }

    /// Which quadrant of its parent this tile occupies.
    pub fn quadrant(&self) -> Quadrant {
        match (self.x.rem_euclid(2), self.y.rem_euclid(2)) {
            (0, 0) => Quadrant::NorthWest,
            (_, 0) => Quadrant::NorthEast,
            (0, _) => Quadrant::SouthWest,
            _ => Quadrant::SouthEast,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.source_id, self.zoom, self.x, self.y)
    }
}

/// Quarter of a parent tile covered by one of its four children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// Pixel offset of this quadrant inside a parent tile of `tile_size` pixels.
    pub fn offset(self, tile_size: u32) -> (u32, u32) {
        let half = tile_size / 2;
        match self {
            Quadrant::NorthWest => (0, 0),
            Quadrant::NorthEast => (half, 0),
            Quadrant::SouthWest => (0, half),
            Quadrant::SouthEast => (half, half),
        }
    }
}
