//! Audio analysis helpers
//!
//! Frame features of a signal, a heuristic vocal-presence score and a
//! 12-bin chroma fingerprint. All analysis runs on 2048-sample frames with
//! a 512-sample hop regardless of quality tier.

use serde::Serialize;
use unmix_core::{AudioBuffer, Sample};
use unmix_dsp::features::{self, FRAME_LENGTH, HOP_LENGTH, mean};
use unmix_dsp::stft;

use crate::config::HpssConfig;
use crate::error::SeparationResult;
use crate::methods::{energy_ratios, hpss};

/// Fraction of spectral magnitude below the rolloff frequency
const ROLLOFF_PERCENT: f64 = 0.85;

/// Per-frame feature tracks plus whole-signal HPSS energy shares
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioProperties {
    pub rms: Vec<f64>,
    pub zero_crossing_rate: Vec<f64>,
    /// Hz
    pub spectral_centroid: Vec<f64>,
    /// Hz
    pub spectral_bandwidth: Vec<f64>,
    /// Hz
    pub spectral_rolloff: Vec<f64>,
    pub harmonic_ratio: f64,
    pub percussive_ratio: f64,
}

impl AudioProperties {
    pub fn mean_rms(&self) -> f64 {
        mean(&self.rms)
    }

    pub fn mean_centroid(&self) -> f64 {
        mean(&self.spectral_centroid)
    }

    pub fn mean_zero_crossing_rate(&self) -> f64 {
        mean(&self.zero_crossing_rate)
    }
}

/// Frame features and HPSS energy shares of a mono signal
pub fn detect_audio_properties(
    signal: &[Sample],
    sample_rate: u32,
) -> SeparationResult<AudioProperties> {
    if signal.is_empty() {
        return Ok(AudioProperties::default());
    }

    let magnitude = stft(signal, FRAME_LENGTH, HOP_LENGTH)?.magnitude();
    let spectral_centroid = features::spectral_centroid(&magnitude, sample_rate, FRAME_LENGTH);
    let spectral_bandwidth =
        features::spectral_bandwidth(&magnitude, sample_rate, FRAME_LENGTH, &spectral_centroid);
    let spectral_rolloff =
        features::spectral_rolloff(&magnitude, sample_rate, FRAME_LENGTH, ROLLOFF_PERCENT);
    let (harmonic_ratio, percussive_ratio) = energy_ratios(signal)?;

    Ok(AudioProperties {
        rms: features::frame_rms(signal, FRAME_LENGTH, HOP_LENGTH),
        zero_crossing_rate: features::zero_crossing_rate(signal, FRAME_LENGTH, HOP_LENGTH),
        spectral_centroid,
        spectral_bandwidth,
        spectral_rolloff,
        harmonic_ratio,
        percussive_ratio,
    })
}

fn mean_centroid(signal: &[Sample], sample_rate: u32) -> SeparationResult<f64> {
    let magnitude = stft(signal, FRAME_LENGTH, HOP_LENGTH)?.magnitude();
    Ok(mean(&features::spectral_centroid(
        &magnitude,
        sample_rate,
        FRAME_LENGTH,
    )))
}

/// Heuristic likelihood in `[0, 1]` that the mix contains vocals.
///
/// Scores the channel average: +0.3 for a mean centroid in the voice range
/// (1-4 kHz), +0.3 for a speech-like mean zero-crossing rate (0.05-0.2),
/// +0.4 when the harmonic layer's mean centroid is above 800 Hz.
pub fn estimate_vocal_presence(buffer: &AudioBuffer) -> SeparationResult<f64> {
    let mono = buffer.mono_mix();
    if mono.is_empty() {
        return Ok(0.0);
    }
    let sample_rate = buffer.sample_rate();

    let mut score = 0.0;

    let centroid = mean_centroid(&mono, sample_rate)?;
    if centroid > 1000.0 && centroid < 4000.0 {
        score += 0.3;
    }

    let zcr = mean(&features::zero_crossing_rate(&mono, FRAME_LENGTH, HOP_LENGTH));
    if zcr > 0.05 && zcr < 0.2 {
        score += 0.3;
    }

    let unit_margins = HpssConfig {
        margin_percussive: 1.0,
        ..HpssConfig::default()
    };
    let harmonic = hpss(&mono, &unit_margins)?.harmonic;
    let harmonic_centroid = mean_centroid(&harmonic, sample_rate)?;
    if harmonic_centroid > 800.0 {
        score += 0.4;
    }

    log::debug!(
        "vocal presence: centroid {:.0} Hz, zcr {:.3}, harmonic centroid {:.0} Hz -> {:.1}",
        centroid,
        zcr,
        harmonic_centroid,
        score
    );
    Ok(f64::min(score, 1.0))
}

/// Mean chroma over all frames: 12 values, C first
pub fn audio_fingerprint(signal: &[Sample], sample_rate: u32) -> SeparationResult<[f64; 12]> {
    if signal.is_empty() {
        return Ok([0.0; 12]);
    }
    let magnitude = stft(signal, FRAME_LENGTH, HOP_LENGTH)?.magnitude();
    let frames = features::chroma(&magnitude, sample_rate, FRAME_LENGTH);

    let mut fingerprint = [0.0; 12];
    for frame in &frames {
        for (acc, v) in fingerprint.iter_mut().zip(frame) {
            *acc += v;
        }
    }
    let n = frames.len().max(1) as f64;
    fingerprint.iter_mut().for_each(|v| *v /= n);
    Ok(fingerprint)
}
