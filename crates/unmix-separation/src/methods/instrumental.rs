//! Instrumental isolation
//!
//! Widens the image (`mid + side` with side emphasis), runs HPSS with a
//! strong percussive margin and keeps mostly the harmonic layer.

use unmix_core::{Sample, mix};
use unmix_dsp::{NormalizeConfig, normalize_with};

use super::hpss::hpss;
use crate::config::InstrumentalConfig;
use crate::error::SeparationResult;
use crate::progress::ProgressSink;

pub fn isolate_instrumental(
    left: &[Sample],
    right: &[Sample],
    config: &InstrumentalConfig,
    norm: &NormalizeConfig,
    progress: &mut dyn ProgressSink,
) -> SeparationResult<Vec<Sample>> {
    progress.report(0.0);

    let wide: Vec<Sample> = left
        .iter()
        .zip(right)
        .map(|(&l, &r)| config.mid_weight * (l + r) + config.side_weight * (l - r))
        .collect();
    progress.report(0.2);

    let parts = hpss(&wide, &config.hpss)?;
    progress.report(0.8);

    let combined = mix(
        &parts.harmonic,
        config.harmonic_weight,
        &parts.percussive,
        config.percussive_weight,
    );
    let out = normalize_with(&combined, norm);
    progress.report(1.0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use unmix_core::rms;

    #[test]
    fn test_output_is_normalized() {
        let left: Vec<f64> = (0..20_000)
            .map(|i| 0.2 * (2.0 * PI * 330.0 * i as f64 / 44100.0).sin())
            .collect();
        let right: Vec<f64> = left.iter().map(|s| s * 0.5).collect();

        let out = isolate_instrumental(
            &left,
            &right,
            &InstrumentalConfig::default(),
            &NormalizeConfig::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(out.len(), left.len());
        assert!(out.iter().all(|s| s.abs() <= 1.0));
        assert_relative_eq!(rms(&out), 10f64.powf(-3.0 / 20.0), epsilon = 0.1);
    }
}
