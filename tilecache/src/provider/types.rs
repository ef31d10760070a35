//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The server answered with an empty body.
    #[error("Empty response from {0}")]
    EmptyBody(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The fetcher panicked while handling the request.
    #[error("Fetch panicked: {0}")]
    Panicked(String),
}
