//! Error types for tile image materialization.

use thiserror::Error;

/// Errors that can occur while turning fetched bytes into an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte buffer is not in a recognized image format.
    #[error("Unrecognized image data: {0}")]
    Unrecognized(String),

    /// The format was recognized but decoding failed.
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    /// The decoded image does not have the expected tile dimensions.
    #[error("Invalid dimensions {width}×{height}: expected {expected}×{expected}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: u32,
    },
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => DecodeError::Unrecognized(e.to_string()),
            other => DecodeError::DecodingFailed(other.to_string()),
        }
    }
}
