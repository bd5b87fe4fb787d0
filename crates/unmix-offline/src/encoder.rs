//! Audio encoding module
//!
//! - WAV via hound (16/24-bit integer, 32-bit float)
//! - FLAC via flac-bound (16/24-bit)

use crate::error::{OfflineError, OfflineResult};
use crate::formats::{FlacConfig, OutputFormat, WavConfig};

use std::io::Cursor;
use std::path::Path;

use unmix_core::AudioBuffer;

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Audio encoder trait
pub trait AudioEncoder {
    /// Encode audio buffer to bytes
    fn encode(&self, buffer: &AudioBuffer) -> OfflineResult<Vec<u8>>;

    /// Get file extension
    fn extension(&self) -> &'static str;
}

fn check_channels(buffer: &AudioBuffer) -> OfflineResult<()> {
    if buffer.num_channels() == 0 {
        return Err(OfflineError::InvalidConfig(
            "Cannot encode a buffer without channels".to_string(),
        ));
    }
    Ok(())
}

/// Scale a sample into a signed integer range
fn quantize(sample: f64, bit_depth: u8) -> i32 {
    let max_val = ((1i64 << (bit_depth - 1)) - 1) as f64;
    (sample.clamp(-1.0, 1.0) * max_val).round() as i32
}

// ═══════════════════════════════════════════════════════════════════════════════
// WAV ENCODER
// ═══════════════════════════════════════════════════════════════════════════════

/// WAV encoder using hound
pub struct WavEncoder {
    config: WavConfig,
}

impl WavEncoder {
    pub fn new(config: WavConfig) -> Self {
        Self { config }
    }
}

impl AudioEncoder for WavEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> OfflineResult<Vec<u8>> {
        check_channels(buffer)?;

        let float = self.config.float && self.config.bit_depth == 32;
        if !matches!(self.config.bit_depth, 16 | 24 | 32) {
            return Err(OfflineError::InvalidConfig(format!(
                "Unsupported WAV bit depth: {}",
                self.config.bit_depth
            )));
        }

        let mut output = Vec::new();
        let cursor = Cursor::new(&mut output);

        let spec = hound::WavSpec {
            channels: buffer.num_channels() as u16,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.config.bit_depth as u16,
            sample_format: if float {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        };

        let mut writer = hound::WavWriter::new(cursor, spec)
            .map_err(|e| OfflineError::EncodingError(e.to_string()))?;

        let samples = buffer.to_interleaved();
        match (self.config.bit_depth, float) {
            (16, _) => {
                for &sample in &samples {
                    writer
                        .write_sample(quantize(sample, 16) as i16)
                        .map_err(|e| OfflineError::EncodingError(e.to_string()))?;
                }
            }
            (_, true) => {
                for &sample in &samples {
                    writer
                        .write_sample(sample as f32)
                        .map_err(|e| OfflineError::EncodingError(e.to_string()))?;
                }
            }
            (bits, false) => {
                for &sample in &samples {
                    writer
                        .write_sample(quantize(sample, bits))
                        .map_err(|e| OfflineError::EncodingError(e.to_string()))?;
                }
            }
        }

        writer
            .finalize()
            .map_err(|e| OfflineError::EncodingError(e.to_string()))?;

        Ok(output)
    }

    fn extension(&self) -> &'static str {
        "wav"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLAC ENCODER
// ═══════════════════════════════════════════════════════════════════════════════

/// FLAC encoder using flac-bound
pub struct FlacEncoder {
    config: FlacConfig,
}

impl FlacEncoder {
    const BLOCK_FRAMES: usize = 4096;

    pub fn new(config: FlacConfig) -> Self {
        Self { config }
    }
}

impl AudioEncoder for FlacEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> OfflineResult<Vec<u8>> {
        use flac_bound::{FlacEncoder as FlacEnc, WriteWrapper};

        check_channels(buffer)?;
        if !matches!(self.config.bit_depth, 16 | 24) {
            return Err(OfflineError::InvalidConfig(format!(
                "Unsupported FLAC bit depth: {}",
                self.config.bit_depth
            )));
        }

        let channels = buffer.num_channels();
        let samples: Vec<i32> = buffer
            .to_interleaved()
            .iter()
            .map(|&s| quantize(s, self.config.bit_depth))
            .collect();

        let mut output = Vec::new();
        {
            let encoder_config = FlacEnc::new()
                .ok_or_else(|| OfflineError::EncodingError("FLAC encoder init failed".to_string()))?
                .channels(channels as u32)
                .sample_rate(buffer.sample_rate())
                .bits_per_sample(self.config.bit_depth as u32)
                .compression_level(self.config.compression_level.min(8) as u32);

            let mut wrapper = WriteWrapper(&mut output);
            let mut encoder = encoder_config.init_write(&mut wrapper).map_err(|e| {
                OfflineError::EncodingError(format!("FLAC init write failed: {:?}", e))
            })?;

            for block in samples.chunks(Self::BLOCK_FRAMES * channels) {
                encoder
                    .process_interleaved(block, (block.len() / channels) as u32)
                    .map_err(|_| OfflineError::EncodingError("FLAC process failed".to_string()))?;
            }

            encoder
                .finish()
                .map_err(|_| OfflineError::EncodingError("FLAC finish failed".to_string()))?;
        }

        Ok(output)
    }

    fn extension(&self) -> &'static str {
        "flac"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Encoder for an output format
pub fn create_encoder(format: &OutputFormat) -> Box<dyn AudioEncoder> {
    match format {
        OutputFormat::Wav(config) => Box::new(WavEncoder::new(*config)),
        OutputFormat::Flac(config) => Box::new(FlacEncoder::new(*config)),
    }
}

/// Encode `buffer` and write it to `path`, creating parent directories.
///
/// Returns the number of bytes written.
pub fn write_output(path: &Path, buffer: &AudioBuffer, format: &OutputFormat) -> OfflineResult<u64> {
    let data = create_encoder(format).encode(buffer)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &data)?;

    log::debug!("Wrote {} bytes of {} to {}", data.len(), format.extension(), path.display());
    Ok(data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize) -> AudioBuffer {
        let left: Vec<f64> = (0..frames).map(|i| i as f64 / frames as f64 - 0.5).collect();
        let right: Vec<f64> = left.iter().map(|s| -s).collect();
        AudioBuffer::from_stereo(left, right, 44100).unwrap()
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(1.0, 16), 32767);
        assert_eq!(quantize(-2.0, 16), -32767);
        assert_eq!(quantize(0.0, 24), 0);
        assert_eq!(quantize(1.0, 24), 8_388_607);
    }

    #[test]
    fn test_wav_header() {
        let bytes = WavEncoder::new(WavConfig::default())
            .encode(&stereo_ramp(1000))
            .unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // header + 1000 frames * 2 ch * 2 bytes
        assert!(bytes.len() >= 44 + 4000);
    }

    #[test]
    fn test_wav_rejects_bit_depth() {
        let encoder = WavEncoder::new(WavConfig { bit_depth: 12, float: false });
        assert!(matches!(
            encoder.encode(&stereo_ramp(10)),
            Err(OfflineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_flac_magic() {
        let bytes = FlacEncoder::new(FlacConfig::default())
            .encode(&stereo_ramp(10_000))
            .unwrap();
        assert_eq!(&bytes[0..4], b"fLaC");
    }

    #[test]
    fn test_create_encoder() {
        assert_eq!(create_encoder(&OutputFormat::wav_24()).extension(), "wav");
        assert_eq!(create_encoder(&OutputFormat::flac()).extension(), "flac");
    }
}
