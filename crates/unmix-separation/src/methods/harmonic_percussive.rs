//! Harmonic layer extraction from the mono mixdown

use unmix_core::Sample;
use unmix_dsp::{NormalizeConfig, normalize_with};

use super::hpss::hpss;
use crate::config::HpssConfig;
use crate::error::SeparationResult;
use crate::progress::ProgressSink;

/// Average the channels, run HPSS and return the normalized harmonic part
pub fn separate_harmonic(
    channels: &[&[Sample]],
    config: &HpssConfig,
    norm: &NormalizeConfig,
    progress: &mut dyn ProgressSink,
) -> SeparationResult<Vec<Sample>> {
    progress.report(0.0);

    let frames = channels.first().map_or(0, |c| c.len());
    let scale = 1.0 / channels.len().max(1) as f64;
    let mono: Vec<Sample> = (0..frames)
        .map(|i| channels.iter().map(|c| c[i]).sum::<f64>() * scale)
        .collect();
    progress.report(0.2);

    let parts = hpss(&mono, config)?;
    progress.report(0.9);

    let out = normalize_with(&parts.harmonic, norm);
    progress.report(1.0);
    Ok(out)
}
