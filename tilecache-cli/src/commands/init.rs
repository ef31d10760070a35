//! Init command - write the default configuration file.

use std::path::Path;

use tilecache::config::TileCacheConfig;

use crate::error::CliError;

/// Run the init command.
pub fn run(path: &Path, force: bool) -> Result<(), CliError> {
    let written = if force {
        TileCacheConfig::default().save_to(path)?;
        true
    } else {
        TileCacheConfig::ensure_exists_at(path)?
    };

    if written {
        println!("Wrote default configuration: {}", path.display());
    } else {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with the defaults.");
    }
    Ok(())
}
