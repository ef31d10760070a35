//! CLI error handling with user-friendly messages.

use std::process;

use thiserror::Error;
use tilecache::config::ConfigError;
use tilecache::executor::PoolError;
use tilecache::provider::FetchError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(#[source] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid command-line arguments
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] FetchError),

    /// The fetch worker pool failed
    #[error("Fetch worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// Failed to install the Ctrl+C handler
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl CliError {
    /// Exit the process with an error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(ConfigError::InvalidValue { .. }) = self {
            eprintln!();
            eprintln!("Run 'tilecache config path' to locate the config file,");
            eprintln!("or 'tilecache init --force' to restore the defaults.");
        }

        process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = CliError::from(ConfigError::InvalidValue {
            section: "cache".to_string(),
            key: "capacity".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration: cache.capacity = '0' - must be at least 1"
        );
    }

    #[test]
    fn test_arguments_message() {
        let err = CliError::Arguments("x-min > x-max".to_string());
        assert!(err.to_string().contains("x-min > x-max"));
    }
}
