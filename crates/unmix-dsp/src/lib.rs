//! unmix-dsp: Spectral and filtering primitives
//!
//! - STFT / ISTFT with centered periodic-Hann frames
//! - Butterworth design (analog prototype -> bilinear) as second-order sections
//! - Zero-phase filtering (`filtfilt`)
//! - Median filters over magnitude spectrograms
//! - RMS normalization and level utilities
//! - Frame features (RMS, zero crossings, centroid, bandwidth, rolloff, chroma)
//! - Spectral gate / spectral subtraction

pub mod error;
pub mod features;
pub mod filter;
pub mod median;
pub mod normalize;
pub mod spectral;
pub mod stft;

pub use error::{DspError, DspResult};
pub use features::{
    FRAME_LENGTH, HOP_LENGTH, chroma, frame_rms, spectral_bandwidth, spectral_centroid,
    spectral_rolloff, zero_crossing_rate,
};
pub use filter::{
    BiquadCoeffs, Filter, design_bandpass, design_bandstop, design_highpass, design_lowpass,
    filtfilt,
};
pub use median::{median_filter_freq, median_filter_time};
pub use normalize::{NormalizeConfig, normalize, normalize_with, trim_silence};
pub use spectral::{spectral_gate, spectral_subtraction};
pub use stft::{Spectrogram, hann_window, istft, istft_with_length, stft};
