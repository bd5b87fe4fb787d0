//! Quality tiers and the STFT geometry they resolve to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// STFT geometry for one `process` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingParameters {
    pub fft_size: usize,
    pub hop_size: usize,
    pub window_size: usize,
}

/// Quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// 1024-point FFT, 50% overlap
    Low,
    /// 2048-point FFT, 75% overlap
    #[default]
    Medium,
    /// 4096-point FFT, 75% overlap
    High,
}

impl QualityLevel {
    /// Tier used for unrecognized quality strings
    pub const PERMISSIVE_DEFAULT: QualityLevel = QualityLevel::Medium;

    pub const ALL: [QualityLevel; 3] = [QualityLevel::Low, QualityLevel::Medium, QualityLevel::High];

    pub fn params(&self) -> ProcessingParameters {
        match self {
            QualityLevel::Low => ProcessingParameters {
                fft_size: 1024,
                hop_size: 512,
                window_size: 1024,
            },
            QualityLevel::Medium => ProcessingParameters {
                fft_size: 2048,
                hop_size: 512,
                window_size: 2048,
            },
            QualityLevel::High => ProcessingParameters {
                fft_size: 4096,
                hop_size: 1024,
                window_size: 4096,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
        }
    }

    /// Parse a quality selector, falling back to
    /// [`QualityLevel::PERMISSIVE_DEFAULT`] for anything unrecognized.
    pub fn resolve(selector: &str) -> QualityLevel {
        selector.parse().unwrap_or_else(|_| {
            log::warn!(
                "Unknown quality '{}', using '{}'",
                selector,
                Self::PERMISSIVE_DEFAULT
            );
            Self::PERMISSIVE_DEFAULT
        })
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityLevel::Low),
            "medium" => Ok(QualityLevel::Medium),
            "high" => Ok(QualityLevel::High),
            other => Err(format!("unknown quality '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let low = QualityLevel::Low.params();
        assert_eq!((low.fft_size, low.hop_size, low.window_size), (1024, 512, 1024));

        let medium = QualityLevel::Medium.params();
        assert_eq!((medium.fft_size, medium.hop_size, medium.window_size), (2048, 512, 2048));

        let high = QualityLevel::High.params();
        assert_eq!((high.fft_size, high.hop_size, high.window_size), (4096, 1024, 4096));
    }

    #[test]
    fn test_tier_geometry_invariant() {
        for level in QualityLevel::ALL {
            let p = level.params();
            assert!(p.hop_size > 0);
            assert!(p.hop_size <= p.window_size && p.window_size <= p.fft_size);
        }
    }

    #[test]
    fn test_permissive_default() {
        assert_eq!(QualityLevel::PERMISSIVE_DEFAULT, QualityLevel::Medium);
        assert_eq!(QualityLevel::resolve("ultra"), QualityLevel::PERMISSIVE_DEFAULT);
        assert_eq!(QualityLevel::resolve(""), QualityLevel::PERMISSIVE_DEFAULT);
        assert_eq!(QualityLevel::resolve("HIGH"), QualityLevel::High);
        assert!("ultra".parse::<QualityLevel>().is_err());
    }
}
