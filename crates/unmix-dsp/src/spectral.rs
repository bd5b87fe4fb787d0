//! Spectral gate and spectral subtraction
//!
//! Both work on the magnitude of a centered STFT (hop = fft / 4), keep the
//! original phase and return a signal of the input length.

use ndarray::{Array1, Axis, s};
use unmix_core::{Sample, db_to_amplitude};

use crate::error::DspResult;
use crate::stft::{Spectrogram, istft_with_length, stft};

/// FFT size for spectral subtraction
const SUBTRACTION_FFT: usize = 2048;

/// Upper bound on frames used for the noise estimate
const NOISE_FRAMES: usize = 10;

/// Zero every bin whose magnitude is not above `threshold_db` relative to
/// the loudest bin of the whole spectrogram.
pub fn spectral_gate(signal: &[Sample], threshold_db: f64, fft_size: usize) -> DspResult<Vec<Sample>> {
    let spec = stft(signal, fft_size, (fft_size / 4).max(1))?;
    let (magnitude, phase) = spec.magphase();

    let max = magnitude.fold(0.0_f64, |m, &v| m.max(v));
    let threshold = db_to_amplitude(threshold_db) * max;
    let gated = magnitude.mapv(|m| if m > threshold { m } else { 0.0 });

    let out = Spectrogram::from_polar(&gated, &phase, spec.fft_size, spec.hop_size)?;
    istft_with_length(&out, signal.len())
}

/// Subtract `alpha` times a stationary noise estimate from every frame,
/// flooring each bin at `beta` times its original magnitude.
///
/// The noise spectrum is the mean of the first `min(10, frames / 4)`
/// frames; with fewer than four frames there is no estimate and the
/// magnitudes pass through.
pub fn spectral_subtraction(signal: &[Sample], alpha: f64, beta: f64) -> DspResult<Vec<Sample>> {
    let spec = stft(signal, SUBTRACTION_FFT, SUBTRACTION_FFT / 4)?;
    let (magnitude, phase) = spec.magphase();

    let noise_frames = NOISE_FRAMES.min(spec.num_frames() / 4);
    let noise: Array1<f64> = if noise_frames == 0 {
        Array1::zeros(spec.num_bins())
    } else {
        magnitude
            .slice(s![.., ..noise_frames])
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(spec.num_bins()))
    };

    let mut enhanced = magnitude.clone();
    for (mut row, &n) in enhanced.rows_mut().into_iter().zip(noise.iter()) {
        row.mapv_inplace(|m| (m - alpha * n).max(beta * m));
    }

    let out = Spectrogram::from_polar(&enhanced, &phase, spec.fft_size, spec.hop_size)?;
    istft_with_length(&out, signal.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use unmix_core::rms;

    #[test]
    fn test_gate_keeps_dominant_tone() {
        let signal: Vec<f64> = (0..8192)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / 44100.0).sin())
            .collect();
        let out = spectral_gate(&signal, -20.0, 2048).unwrap();
        assert_eq!(out.len(), signal.len());
        assert_relative_eq!(rms(&out), rms(&signal), epsilon = 0.05);
    }

    #[test]
    fn test_gate_silence() {
        let out = spectral_gate(&[0.0; 3000], -20.0, 1024).unwrap();
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_subtraction_removes_stationary_noise_floor() {
        // Constant low hum everywhere; subtraction drives it to the floor
        let signal: Vec<f64> = (0..44100)
            .map(|i| 0.1 * (2.0 * PI * 220.0 * i as f64 / 44100.0).sin())
            .collect();
        let out = spectral_subtraction(&signal, 2.0, 0.01).unwrap();
        assert_eq!(out.len(), signal.len());
        assert!(rms(&out) < 0.1 * rms(&signal));
    }

    #[test]
    fn test_subtraction_short_input_passes_through() {
        let signal = vec![0.25; 100];
        let out = spectral_subtraction(&signal, 2.0, 0.01).unwrap();
        for (a, b) in signal.iter().zip(&out) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }
}
