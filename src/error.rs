//! Error types for the gallery core

use thiserror::Error;

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gallery core
#[derive(Error, Debug)]
pub enum Error {
    /// An ad size token was not of the form `<width>x<height>`
    #[error("Invalid ad size: {0:?}")]
    InvalidSize(String),

    /// Failed to load a creative
    #[error("Failed to load creative: {0}")]
    LoadError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// User input rejected before reaching the data layer
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed records from the data-fetch layer
    #[error("Failed to decode records: {0}")]
    Decode(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
