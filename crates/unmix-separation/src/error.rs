//! Error types for separation

use thiserror::Error;
use unmix_core::CoreError;
use unmix_dsp::DspError;

/// Separation error types
#[derive(Error, Debug)]
pub enum SeparationError {
    /// Unknown method selector
    #[error("Invalid separation method: {0}")]
    InvalidMethod(String),

    /// Zero frames or zero channels
    #[error("Input buffer is empty")]
    EmptyBuffer,

    /// No backend can run the method, or the backend failed to initialize
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Model file not found
    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    /// Invalid input shape
    #[error("Invalid input shape: expected {expected}, got {got}")]
    InvalidInputShape { expected: String, got: String },

    /// Invalid output shape
    #[error("Invalid output shape: expected {expected}, got {got}")]
    InvalidOutputShape { expected: String, got: String },

    /// Input rate differs from the model rate
    #[error("Invalid sample rate: expected {expected}, got {got}")]
    SampleRateMismatch { expected: u32, got: u32 },

    /// Inference failed
    #[error("Inference failed: {reason}")]
    InferenceFailed { reason: String },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Dsp(#[from] DspError),

    #[error(transparent)]
    Buffer(#[from] CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for separation operations
pub type SeparationResult<T> = Result<T, SeparationError>;
