//! Audio decoding module
//!
//! Uses symphonia for every container the loader accepts:
//! - WAV, AIFF (PCM)
//! - FLAC, ALAC (lossless)
//! - MP3, OGG Vorbis, AAC (lossy)

use crate::error::{OfflineError, OfflineResult};

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::{Hint, ProbeResult};
use unmix_core::AudioBuffer;

// ═══════════════════════════════════════════════════════════════════════════════
// DECODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Universal audio decoder using symphonia
pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode an audio file to a planar `f64` buffer in `[-1, 1]`
    pub fn decode(path: &Path) -> OfflineResult<AudioBuffer> {
        let mut format = Self::open(path)?.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| OfflineError::ReadError("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let mut sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| OfflineError::ReadError(format!("Failed to create decoder: {}", e)))?;

        let mut interleaved: Vec<f64> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f64>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(OfflineError::ReadError(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("Skipping corrupt packet in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(OfflineError::ReadError(format!("Decode error: {}", e)));
                }
            };

            let spec = *decoded.spec();
            if interleaved.is_empty() {
                channels = spec.channels.count();
                sample_rate = spec.rate;
            } else if spec.channels.count() != channels {
                log::warn!(
                    "Dropping packet with {} channels (stream has {})",
                    spec.channels.count(),
                    channels
                );
                continue;
            }

            // Packet capacity is fixed per stream
            let capacity = decoded.capacity() as u64;
            let buf = sample_buf.get_or_insert_with(|| SampleBuffer::new(capacity, spec));
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }

        let buffer = AudioBuffer::from_interleaved(&interleaved, channels, sample_rate)?;
        log::debug!(
            "Decoded {}: {} frames, {} ch, {} Hz",
            path.display(),
            buffer.frames(),
            buffer.num_channels(),
            buffer.sample_rate()
        );
        Ok(buffer)
    }

    /// Get audio file info without decoding
    pub fn probe(path: &Path) -> OfflineResult<AudioFileInfo> {
        let mut probed = Self::open(path)?;
        let tags = read_tags(&mut probed);
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| OfflineError::ReadError("No audio track found".to_string()))?;

        let codec_params = &track.codec_params;

        let sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);
        let bit_depth = codec_params.bits_per_sample.unwrap_or(16);
        let frames = codec_params.n_frames.unwrap_or(0);

        let format_name = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_uppercase();

        Ok(AudioFileInfo {
            path: path.to_path_buf(),
            format: format_name,
            sample_rate,
            channels,
            bit_depth: bit_depth as u8,
            duration: frames as f64 / sample_rate.max(1) as f64,
            frames: frames as usize,
            file_size,
            tags,
        })
    }

    /// True when `path` decodes to at least one frame of audio
    pub fn validate(path: &Path) -> bool {
        match Self::decode(path) {
            Ok(buffer) => buffer.num_channels() > 0 && !buffer.is_empty(),
            Err(e) => {
                log::debug!("{} failed validation: {}", path.display(), e);
                false
            }
        }
    }

    /// Extensions the decoder is built for
    pub fn supported_formats() -> &'static [&'static str] {
        &["wav", "flac", "mp3", "ogg", "aac", "m4a", "aiff"]
    }

    fn open(path: &Path) -> OfflineResult<ProbeResult> {
        if !path.exists() {
            return Err(OfflineError::InputNotFound(path.display().to_string()));
        }

        let file = File::open(path)
            .map_err(|e| OfflineError::ReadError(format!("Failed to open file: {}", e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| OfflineError::ReadError(format!("Failed to probe format: {}", e)))
    }
}

/// Container tags first (Vorbis comments, RIFF INFO, MP4 atoms), then tags
/// found ahead of the container (ID3v2)
fn read_tags(probed: &mut ProbeResult) -> AudioTags {
    let mut tags = AudioTags::default();
    if let Some(revision) = probed.format.metadata().current() {
        tags.fill_from(revision.tags());
    }
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            tags.fill_from(revision.tags());
        }
    }
    tags
}

/// Descriptive tags; `None` when the file does not carry one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl AudioTags {
    /// Fill still-missing fields from `tags`; the first value seen wins
    pub fn fill_from(&mut self, tags: &[Tag]) {
        for tag in tags {
            let slot = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => &mut self.title,
                Some(StandardTagKey::Artist) => &mut self.artist,
                Some(StandardTagKey::Album) => &mut self.album,
                _ => continue,
            };
            if slot.is_none() {
                let value = tag.value.to_string();
                if !value.trim().is_empty() {
                    *slot = Some(value);
                }
            }
        }
    }
}

/// Audio file information
#[derive(Debug, Clone)]
pub struct AudioFileInfo {
    pub path: PathBuf,
    pub format: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub bit_depth: u8,
    /// Seconds; zero when the container does not declare a length
    pub duration: f64,
    pub frames: usize,
    /// Bytes on disk
    pub file_size: u64,
    pub tags: AudioTags,
}

impl AudioFileInfo {
    /// Duration as `m:ss.mmm` (or `h:mm:ss.mmm`)
    pub fn duration_str(&self) -> String {
        let total_secs = self.duration as u64;
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        let secs = total_secs % 60;
        let ms = ((self.duration - total_secs as f64) * 1000.0).round() as u64;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            format!("{}:{:02}.{:03}", mins, secs, ms)
        }
    }
}
