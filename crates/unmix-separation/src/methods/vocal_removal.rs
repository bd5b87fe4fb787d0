//! Vocal removal
//!
//! Lead vocals are usually mixed to the center, so they cancel in `L - R`
//! and show up as time-frequency bins with near-equal magnitude in both
//! channels. The method blends the two estimates and then notches the
//! bands where residual vocal energy concentrates.

use ndarray::Zip;
use unmix_core::{Sample, mix};
use unmix_dsp::{
    NormalizeConfig, Spectrogram, design_bandstop, filtfilt, istft_with_length, normalize_with,
    stft,
};

use crate::config::VocalRemovalConfig;
use crate::error::SeparationResult;
use crate::progress::ProgressSink;
use crate::quality::ProcessingParameters;

/// How [`center_channel`] combines left and right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterMode {
    /// `L - R`: cancels center content
    Subtract,
    /// `(L + R) / 2`: keeps center content
    Add,
    /// `0.5 (L - R) + 0.1 (L + R)`: mostly side with a little center
    Karaoke,
}

/// Combine two channels of equal length
pub fn center_channel(left: &[Sample], right: &[Sample], mode: CenterMode) -> Vec<Sample> {
    left.iter()
        .zip(right)
        .map(|(&l, &r)| match mode {
            CenterMode::Subtract => l - r,
            CenterMode::Add => (l + r) / 2.0,
            CenterMode::Karaoke => 0.5 * (l - r) + 0.1 * (l + r),
        })
        .collect()
}

/// Left channel with every center bin attenuated.
///
/// A bin is "center" when `min(|L|, |R|) / (max(|L|, |R|) + eps)` exceeds
/// the similarity threshold. The result keeps the left phase and the input
/// length.
pub fn similarity_mask(
    left: &[Sample],
    right: &[Sample],
    params: &ProcessingParameters,
    config: &VocalRemovalConfig,
) -> SeparationResult<Vec<Sample>> {
    let spec_l = stft(left, params.fft_size, params.hop_size)?;
    let spec_r = stft(right, params.fft_size, params.hop_size)?;

    let (mut mag_l, phase_l) = spec_l.magphase();
    let mag_r = spec_r.magnitude();

    let mut center_bins = 0usize;
    Zip::from(&mut mag_l).and(&mag_r).for_each(|l, &r| {
        let similarity = l.min(r) / (l.max(r) + config.epsilon);
        if similarity > config.similarity_threshold {
            *l *= config.center_attenuation;
            center_bins += 1;
        }
    });
    log::debug!(
        "similarity mask: {} of {} bins treated as center",
        center_bins,
        mag_l.len()
    );

    let masked = Spectrogram::from_polar(&mag_l, &phase_l, spec_l.fft_size, spec_l.hop_size)?;
    Ok(istft_with_length(&masked, left.len())?)
}

/// Cascade of zero-phase bandstops over the configured vocal bands
pub fn suppress_vocal_bands(
    signal: &[Sample],
    sample_rate: u32,
    config: &VocalRemovalConfig,
) -> Vec<Sample> {
    config
        .stop_bands
        .iter()
        .fold(signal.to_vec(), |acc, &(low, high)| {
            let filter = design_bandstop(sample_rate, low, high, config.bandstop_order);
            filtfilt(&filter, &acc)
        })
}

/// Full vocal removal on a stereo pair; returns a normalized mono signal
pub fn remove_vocals(
    left: &[Sample],
    right: &[Sample],
    sample_rate: u32,
    params: &ProcessingParameters,
    config: &VocalRemovalConfig,
    norm: &NormalizeConfig,
    progress: &mut dyn ProgressSink,
) -> SeparationResult<Vec<Sample>> {
    progress.report(0.0);

    let removed = center_channel(left, right, CenterMode::Subtract);
    progress.report(0.2);

    let masked = similarity_mask(left, right, params, config)?;
    progress.report(0.6);

    let blended = mix(
        &normalize_with(&removed, norm),
        config.subtraction_weight,
        &normalize_with(&masked, norm),
        config.mask_weight,
    );
    progress.report(0.7);

    let filtered = suppress_vocal_bands(&blended, sample_rate, config);
    progress.report(0.95);

    let out = normalize_with(&filtered, norm);
    progress.report(1.0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::quality::QualityLevel;
    use std::f64::consts::PI;
    use unmix_core::energy;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn test_center_modes() {
        let l = [1.0, 0.5];
        let r = [0.5, 0.5];
        assert_eq!(center_channel(&l, &r, CenterMode::Subtract), vec![0.5, 0.0]);
        assert_eq!(center_channel(&l, &r, CenterMode::Add), vec![0.75, 0.5]);
        let karaoke = center_channel(&l, &r, CenterMode::Karaoke);
        assert!((karaoke[0] - (0.25 + 0.15)).abs() < 1e-12);
        assert!((karaoke[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_identical_channels_are_attenuated() {
        let params = QualityLevel::Medium.params();
        let signal = sine(440.0, 22050);
        let masked = similarity_mask(&signal, &signal, &params, &VocalRemovalConfig::default())
            .unwrap();

        // Every bin is center: x0.1 amplitude, -20 dB energy
        let ratio = energy(&masked) / energy(&signal);
        assert!((ratio - 0.01).abs() < 1e-3, "ratio = {}", ratio);
    }

    #[test]
    fn test_disjoint_channels_pass() {
        let params = QualityLevel::Medium.params();
        let left = sine(440.0, 22050);
        let right = sine(3000.0, 22050);
        let masked =
            similarity_mask(&left, &right, &params, &VocalRemovalConfig::default()).unwrap();
        assert!(energy(&masked) > 0.9 * energy(&left));
    }

    #[test]
    fn test_remove_vocals_length_and_silence() {
        let params = QualityLevel::Low.params();
        let config = VocalRemovalConfig::default();
        let norm = NormalizeConfig::default();

        let silent = vec![0.0; 1500];
        let out =
            remove_vocals(&silent, &silent, 44100, &params, &config, &norm, &mut NoProgress).unwrap();
        assert_eq!(out.len(), 1500);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
