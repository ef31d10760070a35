//! Configuration CLI commands.
//!
//! Provides `config show`, `config path` and `config sources`.

use std::path::Path;

use clap::Subcommand;
use tilecache::config::TileCacheConfig;
use tilecache::provider::UrlTemplateSource;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// List the built-in tile sources
    Sources,
}

/// Run a config subcommand.
pub fn run(path: &Path, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Sources => {
            run_sources();
            Ok(())
        }
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = TileCacheConfig::load_from(path)?;
    let origin = if path.exists() { "" } else { " (not found, defaults)" };

    println!("# {}{}", path.display(), origin);
    for (key, value) in describe(&config) {
        println!("{:<20} = {}", key, value);
    }
    Ok(())
}

fn run_sources() {
    use tilecache::provider::TileSource;

    for source in UrlTemplateSource::presets() {
        println!(
            "{:<12} zoom {:>2}-{:<2} {}",
            source.id(),
            source.min_zoom(),
            source.max_zoom(),
            source.template()
        );
    }
}

/// Flatten a configuration into `section.key` / value pairs.
fn describe(config: &TileCacheConfig) -> Vec<(&'static str, String)> {
    vec![
        ("cache.capacity", config.cache.capacity.to_string()),
        ("fetch.threads", config.fetch.threads.to_string()),
        ("fetch.timeout", config.fetch.timeout_secs.to_string()),
        ("source.id", config.source.id.clone()),
        ("source.url", config.source.url_template.clone()),
        ("source.subdomains", config.source.subdomains.join(",")),
        ("source.min_zoom", config.source.min_zoom.to_string()),
        ("source.max_zoom", config.source.max_zoom.to_string()),
    ]
}
