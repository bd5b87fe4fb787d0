//! Error types for core buffer handling

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Channel {channel} has {got} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        got: usize,
    },

    #[error("Interleaved length {len} is not a multiple of {channels} channels")]
    InterleaveMismatch { len: usize, channels: usize },

    #[error("Buffer has no channels")]
    NoChannels,
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
