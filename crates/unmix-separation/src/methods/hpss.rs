//! Harmonic-percussive source separation by median filtering
//!
//! Harmonic energy is smooth along time, percussive energy is smooth along
//! frequency. Median filtering the magnitude spectrogram in each direction
//! gives the two estimates, which become soft Wiener-style masks on the
//! original complex STFT.

use ndarray::{Array2, Zip};
use unmix_core::{Sample, energy};
use unmix_dsp::{istft_with_length, median_filter_freq, median_filter_time, stft};

use crate::config::HpssConfig;
use crate::error::SeparationResult;

/// Time-domain harmonic and percussive components
#[derive(Debug, Clone, Default)]
pub struct HpssOutput {
    pub harmonic: Vec<Sample>,
    pub percussive: Vec<Sample>,
}

/// Split `signal` into harmonic and percussive parts of the same length.
///
/// Runs on the config's own STFT geometry, independent of quality tier.
pub fn hpss(signal: &[Sample], config: &HpssConfig) -> SeparationResult<HpssOutput> {
    if signal.is_empty() {
        return Ok(HpssOutput::default());
    }

    let spec = stft(signal, config.fft_size, config.hop_size)?;
    let (mask_h, mask_p) = hpss_masks(&spec.magnitude(), config);

    let harmonic = istft_with_length(&spec.masked(&mask_h)?, signal.len())?;
    let percussive = istft_with_length(&spec.masked(&mask_p)?, signal.len())?;

    log::debug!(
        "hpss: {} bins x {} frames, kernels ({}, {}), margins ({}, {})",
        spec.num_bins(),
        spec.num_frames(),
        config.kernel_harmonic,
        config.kernel_percussive,
        config.margin_harmonic,
        config.margin_percussive
    );

    Ok(HpssOutput {
        harmonic,
        percussive,
    })
}

/// Harmonic and percussive soft masks for a magnitude spectrogram
pub fn hpss_masks(magnitude: &Array2<f64>, config: &HpssConfig) -> (Array2<f64>, Array2<f64>) {
    let harm = median_filter_time(magnitude, config.kernel_harmonic);
    let perc = median_filter_freq(magnitude, config.kernel_percussive);

    let split_zeros = config.margin_harmonic == 1.0 && config.margin_percussive == 1.0;

    let mask_h = softmask(
        &harm,
        &(&perc * config.margin_harmonic),
        config.power,
        split_zeros,
    );
    let mask_p = softmask(
        &perc,
        &(&harm * config.margin_percussive),
        config.power,
        split_zeros,
    );
    (mask_h, mask_p)
}

/// `x^p / (x^p + r^p)`, computed relative to `max(x, r)`.
///
/// Where both are (numerically) zero the mask is `0.5` if `split_zeros`,
/// else `0`.
fn softmask(x: &Array2<f64>, reference: &Array2<f64>, power: f64, split_zeros: bool) -> Array2<f64> {
    let fill = if split_zeros { 0.5 } else { 0.0 };
    Zip::from(x).and(reference).map_collect(|&x, &r| {
        let z = x.max(r);
        if z < f64::MIN_POSITIVE {
            return fill;
        }
        let xp = (x / z).powf(power);
        let rp = (r / z).powf(power);
        xp / (xp + rp)
    })
}

/// Harmonic share of total HPSS energy (0 for silence)
pub fn harmonic_ratio(signal: &[Sample]) -> SeparationResult<f64> {
    let (harmonic, _) = energy_ratios(signal)?;
    Ok(harmonic)
}

/// Harmonic and percussive shares of total HPSS energy, unit margins.
/// Both are 0 for silence.
pub fn energy_ratios(signal: &[Sample]) -> SeparationResult<(f64, f64)> {
    let config = HpssConfig {
        margin_percussive: 1.0,
        ..HpssConfig::default()
    };
    let parts = hpss(signal, &config)?;
    let eh = energy(&parts.harmonic);
    let ep = energy(&parts.percussive);
    let total = eh + ep;
    if total > 0.0 {
        Ok((eh / total, ep / total))
    } else {
        Ok((0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::f64::consts::PI;

    #[test]
    fn test_softmask_complementary_with_unit_margins() {
        let mag = array![[1.0, 0.0, 3.0], [2.0, 0.0, 1.0], [0.5, 4.0, 2.0]];
        let config = HpssConfig {
            margin_percussive: 1.0,
            ..HpssConfig::with_kernel(3)
        };
        let (mh, mp) = hpss_masks(&mag, &config);
        for (h, p) in mh.iter().zip(mp.iter()) {
            assert_relative_eq!(h + p, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_softmask_silent_bins() {
        let zeros = Array2::<f64>::zeros((2, 2));
        assert!(softmask(&zeros, &zeros, 2.0, true).iter().all(|&m| m == 0.5));
        assert!(softmask(&zeros, &zeros, 2.0, false).iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_stationary_tone_is_harmonic() {
        let tone: Vec<f64> = (0..44100)
            .map(|i| (2.0 * PI * 440.0 * i as f64 / 44100.0).sin())
            .collect();
        assert!(harmonic_ratio(&tone).unwrap() > 0.9);
    }

    #[test]
    fn test_clicks_are_percussive() {
        let mut clicks = vec![0.0; 44100];
        for i in (0..44100).step_by(11025) {
            clicks[i] = 1.0;
        }
        assert!(harmonic_ratio(&clicks).unwrap() < 0.1);
    }

    #[test]
    fn test_energy_ratios_sum_to_one() {
        let tone: Vec<f64> = (0..22050)
            .map(|i| (2.0 * PI * 220.0 * i as f64 / 22050.0).sin())
            .collect();
        let (h, p) = energy_ratios(&tone).unwrap();
        assert_relative_eq!(h + p, 1.0, epsilon = 1e-12);
        assert!(h > p);
    }

    #[test]
    fn test_hpss_keeps_length() {
        let out = hpss(&[0.1; 777], &HpssConfig::default()).unwrap();
        assert_eq!(out.harmonic.len(), 777);
        assert_eq!(out.percussive.len(), 777);

        let empty = hpss(&[], &HpssConfig::default()).unwrap();
        assert!(empty.harmonic.is_empty());
    }

    #[test]
    fn test_silence_ratio() {
        assert_eq!(harmonic_ratio(&[0.0; 4096]).unwrap(), 0.0);
        assert_eq!(energy_ratios(&[0.0; 4096]).unwrap(), (0.0, 0.0));
    }
}
