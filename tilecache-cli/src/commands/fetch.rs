//! Fetch command - drive a headless viewport over a block of tiles.
//!
//! Runs the same loop a map widget would: apply completions, request every
//! visible tile, ask for the images to draw, then sleep until a worker wakes
//! the loop. Stops when every tile has settled, on timeout or on Ctrl+C.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use tilecache::config::{SourceSettings, TileCacheConfig};
use tilecache::map::{TileMap, TileMapListener};
use tilecache::provider::{FetchError, ReqwestFetcher, TileSource, UrlTemplateSource};
use tilecache::texture::RasterMaterializer;
use tilecache::tile::TileKey;
use tracing::{info, warn};

use crate::error::CliError;

/// How long the loop sleeps waiting for a completion before repainting.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Arguments for `tilecache fetch`.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Zoom level
    #[arg(long, default_value = "2")]
    pub zoom: u8,

    /// First column (default: 0)
    #[arg(long)]
    pub x_min: Option<i32>,

    /// Last column (default: last column of the zoom level)
    #[arg(long)]
    pub x_max: Option<i32>,

    /// First row (default: 0)
    #[arg(long)]
    pub y_min: Option<i32>,

    /// Last row (default: last row of the zoom level)
    #[arg(long)]
    pub y_max: Option<i32>,

    /// Built-in tile source to use instead of the configured one
    #[arg(long)]
    pub source: Option<String>,

    /// Override the cache capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Override the number of fetch threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Give up after this many seconds
    #[arg(long, default_value = "60")]
    pub wait: u64,
}

/// Inclusive block of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRange {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
}

impl TileRange {
    fn from_args(args: &FetchArgs, zoom: u8) -> Result<Self, CliError> {
        let last = ((1i64 << zoom.min(30)) - 1) as i32;
        let range = Self {
            x_min: args.x_min.unwrap_or(0).max(0),
            x_max: args.x_max.unwrap_or(last).min(last),
            y_min: args.y_min.unwrap_or(0).max(0),
            y_max: args.y_max.unwrap_or(last).min(last),
        };
        if range.x_min > range.x_max || range.y_min > range.y_max {
            return Err(CliError::Arguments(format!(
                "empty tile range x {}..={} y {}..={} at zoom {}",
                range.x_min, range.x_max, range.y_min, range.y_max, zoom
            )));
        }
        Ok(range)
    }

    fn len(&self) -> usize {
        ((self.x_max - self.x_min + 1) as usize) * ((self.y_max - self.y_min + 1) as usize)
    }

    fn tiles(&self) -> Vec<(i32, i32)> {
        (self.y_min..=self.y_max)
            .flat_map(|y| (self.x_min..=self.x_max).map(move |x| (x, y)))
            .collect()
    }
}

#[derive(Debug, Default)]
struct Progress {
    loaded: usize,
    failed: usize,
}

/// Counts tile completions for the summary.
struct ProgressListener(Rc<RefCell<Progress>>);

impl TileMapListener for ProgressListener {
    fn tile_updated(&mut self, key: &TileKey) {
        self.0.borrow_mut().loaded += 1;
        tracing::debug!(tile = %key, "Tile loaded");
    }

    fn tile_failed(&mut self, key: &TileKey, error: &FetchError) {
        self.0.borrow_mut().failed += 1;
        warn!(tile = %key, error = %error, "Tile failed");
    }
}

/// Run the fetch command.
pub fn run(config_path: &Path, args: FetchArgs) -> Result<(), CliError> {
    let _logging = tilecache::logging::init_logging(
        tilecache::logging::default_log_dir(),
        tilecache::logging::default_log_file(),
    )
    .map_err(CliError::LoggingInit)?;

    let config = effective_config(config_path, &args)?;
    let source = Arc::new(config.source.to_source());
    let zoom = source.clamp_zoom(args.zoom);
    if zoom != args.zoom {
        warn!(requested = args.zoom, zoom, source = source.id(), "Zoom clamped to source range");
    }

    let range = TileRange::from_args(&args, zoom)?;
    if range.len() > config.cache.capacity {
        return Err(CliError::Arguments(format!(
            "{} tiles do not fit in a cache of {}; narrow the range or raise --capacity",
            range.len(),
            config.cache.capacity
        )));
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    let progress = Rc::new(RefCell::new(Progress::default()));
    let fetcher = Arc::new(ReqwestFetcher::with_timeout(config.fetch.timeout_secs)?);
    let mut map = TileMap::builder(source, fetcher, RasterMaterializer::new())
        .with_config(&config)
        .zoom(zoom)
        .listener(Box::new(ProgressListener(Rc::clone(&progress))))
        .build()?;

    let tiles = range.tiles();
    info!(count = tiles.len(), zoom, source = map.source().id(), "Fetching tiles");

    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.wait);
    let mut drawable;
    loop {
        map.process_completions();
        for &(x, y) in &tiles {
            map.request_tile(x, y)?;
        }
        drawable = tiles
            .iter()
            .filter(|&&(x, y)| map.tile_image(x, y).is_drawable())
            .count();

        if map.pending_fetches() == 0 {
            break;
        }
        if !running.load(Ordering::SeqCst) {
            warn!("Interrupted");
            break;
        }
        if Instant::now() >= deadline {
            warn!(pending = map.pending_fetches(), "Timed out waiting for tiles");
            break;
        }
        map.wait_for_completions(FRAME_INTERVAL);
    }

    let progress = progress.borrow();
    println!();
    println!(
        "Tiles:   {} requested, {} loaded, {} failed, {} drawable",
        tiles.len(),
        progress.loaded,
        progress.failed,
        drawable
    );
    println!("Cache:   {}", map.stats());
    println!("Elapsed: {:.1}s", started.elapsed().as_secs_f64());

    map.dispose();
    Ok(())
}

/// Load the config file and apply command-line overrides.
fn effective_config(path: &Path, args: &FetchArgs) -> Result<TileCacheConfig, CliError> {
    let mut config = TileCacheConfig::load_from(path)?;

    if let Some(id) = &args.source {
        let preset = UrlTemplateSource::preset(id).ok_or_else(|| {
            CliError::Arguments(format!(
                "unknown source '{}', see 'tilecache config sources'",
                id
            ))
        })?;
        config = config.with_source(SourceSettings::from_preset(&preset));
    }
    if let Some(capacity) = args.capacity {
        config = config.with_capacity(capacity);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    Ok(config)
}
