//! DSP error types

use thiserror::Error;

/// Errors from spectral analysis and filter setup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DspError {
    #[error("Invalid FFT size: {0} (must be even and at least 2)")]
    InvalidFftSize(usize),

    #[error("Invalid hop size {hop} for FFT size {fft_size}")]
    InvalidHopSize { hop: usize, fft_size: usize },

    #[error("Spectrogram shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("FFT error: {0}")]
    Fft(String),
}

pub type DspResult<T> = Result<T, DspError>;
