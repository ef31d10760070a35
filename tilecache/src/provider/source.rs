//! Tile sources.
//!
//! A tile source turns a [`TileKey`] into the URL the tile is fetched from
//! and declares which zoom levels it serves.
//!
//! # URL Templates
//!
//! [`UrlTemplateSource`] expands the usual slippy-map placeholders:
//! - `{z}`: zoom level
//! - `{x}`: column (0 to 2^zoom - 1, west to east)
//! - `{y}`: row (0 to 2^zoom - 1, north to south)
//! - `{s}`: subdomain, chosen as `(x + y) % n` to spread load across servers

use crate::tile::{TileKey, TILE_SIZE};

/// Default URL template (OpenStreetMap standard tiles).
pub const DEFAULT_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Source of map tiles.
pub trait TileSource: Send + Sync {
    /// Identifier stored in every [`TileKey`] for this source.
    fn id(&self) -> &str;

    /// URL to fetch the tile for `key` from.
    fn tile_url(&self, key: &TileKey) -> String;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Edge length of the served tiles in pixels.
    fn tile_size(&self) -> u32 {
        TILE_SIZE
    }

    /// Checks if this source serves the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }

    /// Clamp `zoom` into the supported range.
    fn clamp_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.min_zoom(), self.max_zoom().max(self.min_zoom()))
    }
}

/// Tile source described by a URL template.
///
/// # Example
///
/// ```
/// use tilecache::provider::{TileSource, UrlTemplateSource};
/// use tilecache::tile::TileKey;
///
/// let source = UrlTemplateSource::openstreetmap();
/// let key = TileKey::new(source.id(), 8583, 5735, 14);
/// assert_eq!(
///     source.tile_url(&key),
///     "https://tile.openstreetmap.org/14/8583/5735.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplateSource {
    id: String,
    template: String,
    subdomains: Vec<String>,
    min_zoom: u8,
    max_zoom: u8,
}

impl UrlTemplateSource {
    /// Creates a source serving zoom levels 0 to 18.
    ///
    /// # Arguments
    ///
    /// * `id` - Source identifier used in tile keys
    /// * `template` - URL template with `{z}`, `{x}`, `{y}` and optional `{s}`
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
            subdomains: Vec::new(),
            min_zoom: 0,
            max_zoom: 18,
        }
    }

    /// Set the subdomains substituted for `{s}`.
    pub fn with_subdomains<S: Into<String>>(mut self, subdomains: impl IntoIterator<Item = S>) -> Self {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the supported zoom range.
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// OpenStreetMap standard tile layer.
    pub fn openstreetmap() -> Self {
        Self::new("osm", DEFAULT_URL_TEMPLATE).with_zoom_range(0, 19)
    }

    /// OpenTopoMap topographic layer.
    pub fn opentopomap() -> Self {
        Self::new("opentopomap", "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png")
            .with_subdomains(["a", "b", "c"])
            .with_zoom_range(0, 17)
    }

    /// Built-in sources, the default first.
    pub fn presets() -> Vec<Self> {
        vec![Self::openstreetmap(), Self::opentopomap()]
    }

    /// Find a built-in source by id.
    pub fn preset(id: &str) -> Option<Self> {
        Self::presets().into_iter().find(|s| s.id == id)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    fn subdomain_for(&self, key: &TileKey) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let n = self.subdomains.len() as i64;
        let index = (key.x() as i64 + key.y() as i64).rem_euclid(n) as usize;
        &self.subdomains[index]
    }
}

impl Default for UrlTemplateSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

impl TileSource for UrlTemplateSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn tile_url(&self, key: &TileKey) -> String {
        self.template
            .replace("{s}", self.subdomain_for(key))
            .replace("{z}", &key.zoom().to_string())
            .replace("{x}", &key.x().to_string())
            .replace("{y}", &key.y().to_string())
    }

    fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}
