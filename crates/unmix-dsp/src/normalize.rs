//! Loudness normalization and level utilities

use serde::{Deserialize, Serialize};
use unmix_core::{Sample, db_to_amplitude, peak, rms, scaled};

use crate::features::{FRAME_LENGTH, HOP_LENGTH, frame_rms};

pub use unmix_core::{apply_gain_db, fade_in_out};

/// RMS normalization targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Target RMS level in dBFS
    pub target_db: f64,
    /// Peak the output is pulled back to when the gain would clip
    pub ceiling: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_db: -3.0,
            ceiling: 0.95,
        }
    }
}

/// Normalize to -3 dBFS RMS with a 0.95 peak ceiling
pub fn normalize(signal: &[Sample]) -> Vec<Sample> {
    normalize_with(signal, &NormalizeConfig::default())
}

/// Scale `signal` to the configured RMS; if that pushes the peak above
/// 1.0, rescale so the peak sits at `ceiling`. Empty and silent input is
/// returned unchanged.
pub fn normalize_with(signal: &[Sample], config: &NormalizeConfig) -> Vec<Sample> {
    let level = rms(signal);
    if signal.is_empty() || level == 0.0 || !level.is_finite() {
        return signal.to_vec();
    }

    let target = db_to_amplitude(config.target_db);
    let mut out = scaled(signal, target / level);

    let out_peak = peak(&out);
    if out_peak > 1.0 {
        let fix = config.ceiling / out_peak;
        out.iter_mut().for_each(|s| *s *= fix);
    }
    out
}

// ============ Silence trimming ============

/// Drop leading and trailing frames whose RMS is at or below
/// `threshold_db` (absolute dBFS). Fully silent input is returned as is.
///
/// Frames are 2048 samples, hop 512, centered on `t * hop` with zero
/// padding, so every RMS is taken over a full frame. The kept range runs
/// from `first * hop` to `(last + 1) * hop + frame`, clamped to the input.
pub fn trim_silence(signal: &[Sample], threshold_db: f64) -> Vec<Sample> {
    let threshold = db_to_amplitude(threshold_db);
    let levels = frame_rms(signal, FRAME_LENGTH, HOP_LENGTH);

    let (Some(first), Some(last)) = (
        levels.iter().position(|&r| r > threshold),
        levels.iter().rposition(|&r| r > threshold),
    ) else {
        return signal.to_vec();
    };

    let start = first * HOP_LENGTH;
    let end = ((last + 1) * HOP_LENGTH + FRAME_LENGTH).min(signal.len());
    log::debug!(
        "trim_silence: keeping samples {}..{} of {}",
        start,
        end,
        signal.len()
    );
    signal[start..end].to_vec()
}
