//! Error types for the item queue and its collaborators

use thiserror::Error;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, encoding or queueing items
#[derive(Error, Debug)]
pub enum Error {
    /// A required page element or handler is missing
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// An item carries both or neither of text content and file
    #[error("Ambiguous item: {0}")]
    EncodingAmbiguity(String),

    /// Failed to serialize an item
    #[error("Failed to encode item: {0}")]
    EncodeError(String),

    /// Failed to reconstruct an item from its encoded form
    #[error("Failed to decode item: {0}")]
    DecodeError(String),

    /// The page URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Rasterizing an element failed
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
