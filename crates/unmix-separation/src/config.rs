//! Engine configuration
//!
//! Every constant a method depends on lives here with its default, so a
//! JSON file can override any subset (missing fields keep their defaults).

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use unmix_dsp::NormalizeConfig;

use crate::error::SeparationResult;

/// Vocal removal constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocalRemovalConfig {
    /// Weight of the normalized `L - R` signal in the blend
    pub subtraction_weight: f64,
    /// Weight of the normalized similarity-masked signal in the blend
    pub mask_weight: f64,
    /// Bins with `min/max` magnitude ratio above this are treated as center
    pub similarity_threshold: f64,
    /// Gain applied to center bins
    pub center_attenuation: f64,
    /// Denominator guard for the similarity ratio
    pub epsilon: f64,
    /// Butterworth order of each bandstop
    pub bandstop_order: usize,
    /// Bands (Hz) removed after blending, applied in order
    pub stop_bands: Vec<(f64, f64)>,
}

impl Default for VocalRemovalConfig {
    fn default() -> Self {
        Self {
            subtraction_weight: 0.3,
            mask_weight: 0.7,
            similarity_threshold: 0.8,
            center_attenuation: 0.1,
            epsilon: 1e-10,
            bandstop_order: 4,
            stop_bands: vec![(80.0, 300.0), (2000.0, 4000.0)],
        }
    }
}

/// Median-filter HPSS settings
///
/// The STFT geometry is part of the method, not the quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HpssConfig {
    pub fft_size: usize,
    pub hop_size: usize,
    /// Median length across frames
    pub kernel_harmonic: usize,
    /// Median length across bins
    pub kernel_percussive: usize,
    pub margin_harmonic: f64,
    pub margin_percussive: f64,
    /// Soft mask exponent
    pub power: f64,
}

impl Default for HpssConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_size: 512,
            kernel_harmonic: 31,
            kernel_percussive: 31,
            margin_harmonic: 1.0,
            margin_percussive: 5.0,
            power: 2.0,
        }
    }
}

impl HpssConfig {
    /// Square kernel with the given size, default margins
    pub fn with_kernel(kernel: usize) -> Self {
        Self {
            kernel_harmonic: kernel,
            kernel_percussive: kernel,
            ..Self::default()
        }
    }
}

/// Field-wise overrides for an [`HpssConfig`] with a non-default base
#[derive(Default, Deserialize)]
#[serde(default)]
struct HpssOverrides {
    fft_size: Option<usize>,
    hop_size: Option<usize>,
    kernel_harmonic: Option<usize>,
    kernel_percussive: Option<usize>,
    margin_harmonic: Option<f64>,
    margin_percussive: Option<f64>,
    power: Option<f64>,
}

impl HpssOverrides {
    fn apply(self, base: HpssConfig) -> HpssConfig {
        HpssConfig {
            fft_size: self.fft_size.unwrap_or(base.fft_size),
            hop_size: self.hop_size.unwrap_or(base.hop_size),
            kernel_harmonic: self.kernel_harmonic.unwrap_or(base.kernel_harmonic),
            kernel_percussive: self.kernel_percussive.unwrap_or(base.kernel_percussive),
            margin_harmonic: self.margin_harmonic.unwrap_or(base.margin_harmonic),
            margin_percussive: self.margin_percussive.unwrap_or(base.margin_percussive),
            power: self.power.unwrap_or(base.power),
        }
    }
}

/// Kernel used by the harmonic/percussive method
const HARMONIC_PERCUSSIVE_KERNEL: usize = 17;

/// Missing fields fall back to the harmonic/percussive defaults (kernel 17),
/// not to `HpssConfig::default()`.
fn harmonic_percussive_hpss<'de, D>(deserializer: D) -> Result<HpssConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HpssOverrides::deserialize(deserializer)?;
    Ok(overrides.apply(HpssConfig::with_kernel(HARMONIC_PERCUSSIVE_KERNEL)))
}

/// Instrumental isolation constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentalConfig {
    /// Weight of `L + R`
    pub mid_weight: f64,
    /// Weight of `L - R`
    pub side_weight: f64,
    pub harmonic_weight: f64,
    pub percussive_weight: f64,
    pub hpss: HpssConfig,
}

impl Default for InstrumentalConfig {
    fn default() -> Self {
        Self {
            mid_weight: 0.7,
            side_weight: 0.3,
            harmonic_weight: 0.8,
            percussive_weight: 0.2,
            hpss: HpssConfig::default(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vocal_removal: VocalRemovalConfig,
    pub instrumental: InstrumentalConfig,
    /// HPSS settings for the harmonic/percussive method
    #[serde(deserialize_with = "harmonic_percussive_hpss")]
    pub harmonic_percussive: HpssConfig,
    pub normalize: NormalizeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocal_removal: VocalRemovalConfig::default(),
            instrumental: InstrumentalConfig::default(),
            harmonic_percussive: HpssConfig::with_kernel(HARMONIC_PERCUSSIVE_KERNEL),
            normalize: NormalizeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> SeparationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SeparationResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded engine config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> SeparationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.vocal_removal.subtraction_weight, 0.3);
        assert_eq!(config.vocal_removal.mask_weight, 0.7);
        assert_eq!(config.vocal_removal.similarity_threshold, 0.8);
        assert_eq!(config.vocal_removal.center_attenuation, 0.1);
        assert_eq!(config.instrumental.hpss.kernel_harmonic, 31);
        assert_eq!(config.harmonic_percussive.kernel_percussive, 17);
        assert_eq!(config.harmonic_percussive.margin_percussive, 5.0);
        assert_eq!(config.harmonic_percussive.fft_size, 2048);
        assert_eq!(config.instrumental.hpss.hop_size, 512);
    }

    #[test]
    fn test_partial_harmonic_percussive_keeps_its_kernel() {
        let json = r#"{ "harmonic_percussive": { "power": 1.0 } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.harmonic_percussive.power, 1.0);
        assert_eq!(config.harmonic_percussive.kernel_harmonic, 17);
        assert_eq!(config.harmonic_percussive.kernel_percussive, 17);
        assert_eq!(config.harmonic_percussive.margin_percussive, 5.0);

        let json = r#"{ "harmonic_percussive": { "kernel_percussive": 9, "hop_size": 256 } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.harmonic_percussive.kernel_harmonic, 17);
        assert_eq!(config.harmonic_percussive.kernel_percussive, 9);
        assert_eq!(config.harmonic_percussive.hop_size, 256);
        assert_eq!(config.harmonic_percussive.fft_size, 2048);

        // instrumental keeps the plain defaults
        let json = r#"{ "instrumental": { "hpss": { "power": 1.0 } } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.instrumental.hpss.kernel_harmonic, 31);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "vocal_removal": { "similarity_threshold": 0.9 } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.vocal_removal.similarity_threshold, 0.9);
        assert_eq!(config.vocal_removal.mask_weight, 0.7);
        assert_eq!(config.harmonic_percussive, HpssConfig::with_kernel(17));
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.instrumental.harmonic_weight = 0.9;
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(EngineConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_json() {
        assert!(EngineConfig::from_json_str("{ not json").is_err());
    }
}
