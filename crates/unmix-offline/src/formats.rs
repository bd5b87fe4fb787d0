//! Output format definitions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output container for separated audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// WAV (PCM)
    Wav(WavConfig),

    /// FLAC (lossless)
    Flac(FlacConfig),
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Wav(WavConfig::default())
    }
}

impl OutputFormat {
    /// Pick the container for a file extension.
    ///
    /// `flac` (any case) selects FLAC; everything else, including `wav`,
    /// unknown and missing extensions, selects WAV.
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("flac") {
            Self::flac()
        } else {
            Self::wav_16()
        }
    }

    /// Container for an output path, see [`from_extension`](Self::from_extension)
    pub fn for_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or(""))
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav(_) => "wav",
            Self::Flac(_) => "flac",
        }
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            Self::Wav(config) => config.bit_depth,
            Self::Flac(config) => config.bit_depth,
        }
    }

    /// Same container at another bit depth.
    ///
    /// WAV at 32 bits switches to float samples; FLAC keeps integer PCM.
    pub fn with_bit_depth(self, bit_depth: u8) -> Self {
        match self {
            Self::Wav(_) => Self::Wav(WavConfig {
                bit_depth,
                float: bit_depth == 32,
            }),
            Self::Flac(config) => Self::Flac(FlacConfig { bit_depth, ..config }),
        }
    }

    /// Create WAV 16-bit format
    pub fn wav_16() -> Self {
        Self::Wav(WavConfig::default())
    }

    /// Create WAV 24-bit format
    pub fn wav_24() -> Self {
        Self::Wav(WavConfig { bit_depth: 24, float: false })
    }

    /// Create WAV 32-bit float format
    pub fn wav_32f() -> Self {
        Self::Wav(WavConfig { bit_depth: 32, float: true })
    }

    /// Create FLAC format
    pub fn flac() -> Self {
        Self::Flac(FlacConfig::default())
    }
}

/// Keep `.wav`/`.flac` output paths, rewrite anything else to `.wav`
pub fn resolve_output_path(path: &Path) -> PathBuf {
    let keep = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("flac"));
    if keep {
        path.to_path_buf()
    } else {
        path.with_extension("wav")
    }
}

/// WAV configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavConfig {
    /// 16, 24 or 32
    pub bit_depth: u8,
    /// IEEE float samples (32-bit only)
    pub float: bool,
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            bit_depth: 16,
            float: false,
        }
    }
}

/// FLAC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlacConfig {
    /// 16 or 24
    pub bit_depth: u8,
    /// 0 (fastest) to 8 (smallest)
    pub compression_level: u8,
}

impl Default for FlacConfig {
    fn default() -> Self {
        Self {
            bit_depth: 16,
            compression_level: 5,
        }
    }
}
