//! INI parsing logic for converting `Ini` → `TileCacheConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;

use ini::Ini;

use super::file::ConfigError;
use super::settings::{clamp_threads, SourceSettings, TileCacheConfig};
use crate::executor::MAX_FETCH_THREADS;
use crate::provider::{TileSource, UrlTemplateSource};

/// Parse an `Ini` object into a `TileCacheConfig`.
///
/// Starts from `TileCacheConfig::default()` and overlays any values found in
/// the INI. Unknown keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<TileCacheConfig, ConfigError> {
    let mut config = TileCacheConfig::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("capacity") {
            let capacity: usize = parse_number("cache", "capacity", v)?;
            if capacity == 0 {
                return Err(invalid("cache", "capacity", v, "must be at least 1"));
            }
            config.cache.capacity = capacity;
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("threads") {
            let threads: usize = parse_number("fetch", "threads", v)?;
            if threads == 0 {
                return Err(invalid("fetch", "threads", v, "must be at least 1"));
            }
            if threads > MAX_FETCH_THREADS {
                tracing::warn!(
                    threads,
                    max = MAX_FETCH_THREADS,
                    "fetch.threads above maximum, clamping"
                );
            }
            config.fetch.threads = clamp_threads(threads);
        }
        if let Some(v) = section.get("timeout") {
            let timeout: u64 = parse_number("fetch", "timeout", v)?;
            if timeout == 0 {
                return Err(invalid("fetch", "timeout", v, "must be a positive integer (seconds)"));
            }
            config.fetch.timeout_secs = timeout;
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        // A preset supplies defaults for every other key in the section.
        if let Some(v) = section.get("preset") {
            let v = v.trim().to_lowercase();
            if !v.is_empty() {
                let preset = UrlTemplateSource::preset(&v).ok_or_else(|| {
                    let names: Vec<String> = UrlTemplateSource::presets()
                        .iter()
                        .map(|p| p.id().to_string())
                        .collect();
                    invalid(
                        "source",
                        "preset",
                        &v,
                        &format!("must be one of: {}", names.join(", ")),
                    )
                })?;
                config.source = SourceSettings::from_preset(&preset);
            }
        }
        if let Some(v) = section.get("id") {
            let v = v.trim();
            if v.is_empty() || v.contains('/') {
                return Err(invalid("source", "id", v, "must be non-empty and contain no '/'"));
            }
            config.source.id = v.to_string();
        }
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !(v.contains("{z}") && v.contains("{x}") && v.contains("{y}")) {
                return Err(invalid(
                    "source",
                    "url",
                    v,
                    "must contain {z}, {x} and {y} placeholders",
                ));
            }
            config.source.url_template = v.to_string();
        }
        if let Some(v) = section.get("subdomains") {
            config.source.subdomains = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = section.get("min_zoom") {
            config.source.min_zoom = parse_zoom("min_zoom", v)?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.source.max_zoom = parse_zoom("max_zoom", v)?;
        }
        if config.source.min_zoom > config.source.max_zoom {
            return Err(invalid(
                "source",
                "min_zoom",
                &config.source.min_zoom.to_string(),
                "must not exceed max_zoom",
            ));
        }
        if config.source.url_template.contains("{s}") && config.source.subdomains.is_empty() {
            tracing::warn!(
                url = %config.source.url_template,
                "source.url uses {{s}} but no subdomains are configured"
            );
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_zoom(key: &str, value: &str) -> Result<u8, ConfigError> {
    match value.trim().parse::<u8>() {
        Ok(zoom) if zoom <= 30 => Ok(zoom),
        _ => Err(invalid("source", key, value, "must be a zoom level between 0 and 30")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TileCacheConfig, ConfigError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), TileCacheConfig::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = parse(
            "[cache]\ncapacity = 64\n\
             [fetch]\nthreads = 8\ntimeout = 10\n\
             [source]\nid = local\nurl = http://{s}.local/{z}/{x}/{y}.png\n\
             subdomains = a, b\nmin_zoom = 2\nmax_zoom = 14\n",
        )
        .unwrap();

        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.fetch.threads, 8);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.source.id, "local");
        assert_eq!(config.source.url_template, "http://{s}.local/{z}/{x}/{y}.png");
        assert_eq!(config.source.subdomains, vec!["a", "b"]);
        assert_eq!(config.source.min_zoom, 2);
        assert_eq!(config.source.max_zoom, 14);
    }

    #[test]
    fn test_threads_are_clamped() {
        let config = parse("[fetch]\nthreads = 40\n").unwrap();
        assert_eq!(config.fetch.threads, MAX_FETCH_THREADS);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = parse("[cache]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref section, ref key, .. } if section == "cache" && key == "capacity"
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = parse("[fetch]\nthreads = many\n").unwrap_err();
        assert!(err.to_string().contains("fetch.threads = 'many'"));
    }

    #[test]
    fn test_url_without_placeholders_rejected() {
        assert!(parse("[source]\nurl = http://example.com/tile.png\n").is_err());
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        assert!(parse("[source]\nmin_zoom = 10\nmax_zoom = 5\n").is_err());
    }

    #[test]
    fn test_preset_then_override() {
        let config = parse("[source]\npreset = opentopomap\nmax_zoom = 15\n").unwrap();
        assert_eq!(config.source.id, "opentopomap");
        assert_eq!(config.source.subdomains, vec!["a", "b", "c"]);
        assert_eq!(config.source.max_zoom, 15);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let err = parse("[source]\npreset = nowhere\n").unwrap_err();
        assert!(err.to_string().contains("osm, opentopomap"));
    }
}
