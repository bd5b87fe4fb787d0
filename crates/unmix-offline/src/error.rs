//! Error types for file jobs

use thiserror::Error;
use unmix_core::CoreError;
use unmix_separation::SeparationError;

/// Offline processing errors
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Failed to read audio file: {0}")]
    ReadError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Separation failed: {0}")]
    Separation(#[from] SeparationError),

    #[error("Invalid audio buffer: {0}")]
    Buffer(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for offline operations
pub type OfflineResult<T> = Result<T, OfflineError>;
