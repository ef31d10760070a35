//! INI serialization logic for converting `TileCacheConfig` → INI string.

use super::settings::TileCacheConfig;
use crate::executor::MAX_FETCH_THREADS;

/// Convert a `TileCacheConfig` to a commented INI string for saving.
pub(super) fn to_config_string(config: &TileCacheConfig) -> String {
    format!(
        r#"[cache]
; Maximum number of map tiles held in memory (default: 256)
; The least recently used tile is dropped when the cache is full.
capacity = {}

[fetch]
; Number of background download threads (1 to {})
threads = {}
; HTTP request timeout in seconds (default: 30)
timeout = {}

[source]
; Optional built-in source to start from: osm, opentopomap
; Keys below override the preset.
; preset = osm
; Identifier used in tile keys
id = {}
; URL template. Placeholders: {{z}} zoom, {{x}} column, {{y}} row,
; {{s}} subdomain (rotated by tile position)
url = {}
; Comma-separated subdomains for {{s}}, e.g. a,b,c
subdomains = {}
min_zoom = {}
max_zoom = {}
"#,
        config.cache.capacity,
        MAX_FETCH_THREADS,
        config.fetch.threads,
        config.fetch.timeout_secs,
        config.source.id,
        config.source.url_template,
        config.source.subdomains.join(","),
        config.source.min_zoom,
        config.source.max_zoom,
    )
}
