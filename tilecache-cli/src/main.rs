//! tilecache CLI - headless driver for the tile cache and fetch engine.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilecache")]
#[command(version, about = "Fetch and cache map tiles", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.tilecache/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a range of tiles through the cache and report statistics
    Fetch(FetchArgs),

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(tilecache::config::config_file_path);

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(&config_path, args),
        Commands::Config { command } => commands::config::run(&config_path, command),
        Commands::Init { force } => commands::init::run(&config_path, force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
