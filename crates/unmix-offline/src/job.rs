//! Separation job definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use unmix_separation::{QualityLevel, SeparationMethod};

use crate::error::{OfflineError, OfflineResult};
use crate::formats::{OutputFormat, resolve_output_path};

/// Unique job identifier
pub type JobId = u64;

static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One file-to-file separation request
#[derive(Debug, Clone)]
pub struct SeparationJob {
    pub id: JobId,
    pub input_path: PathBuf,
    /// Already resolved: always ends in `.wav` or `.flac`
    pub output_path: PathBuf,
    pub method: SeparationMethod,
    pub quality: QualityLevel,
    pub format: OutputFormat,
    /// Display name, defaults to the input file stem
    pub name: String,
}

impl SeparationJob {
    /// Create new job builder
    pub fn builder() -> JobBuilder {
        JobBuilder::new()
    }

    /// Check the input exists before any work is done
    pub fn validate(&self) -> OfflineResult<()> {
        if !self.input_path.is_file() {
            return Err(OfflineError::InputNotFound(
                self.input_path.display().to_string(),
            ));
        }
        Ok(())
    }
}

/// Job builder for fluent API
#[derive(Debug, Default)]
pub struct JobBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    method: Option<SeparationMethod>,
    quality: QualityLevel,
    bit_depth: Option<u8>,
    name: Option<String>,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set input file
    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set output file. Extensions other than wav/flac become `.wav`.
    pub fn output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Defaults to vocal removal
    pub fn method(mut self, method: SeparationMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn quality(mut self, quality: QualityLevel) -> Self {
        self.quality = quality;
        self
    }

    /// Output sample width; the container's default otherwise
    pub fn bit_depth(mut self, bits: u8) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the job
    pub fn build(self) -> OfflineResult<SeparationJob> {
        let input_path = self.input_path.ok_or_else(|| {
            OfflineError::InvalidConfig("Input path is required".to_string())
        })?;

        let requested = self.output_path.ok_or_else(|| {
            OfflineError::InvalidConfig("Output path is required".to_string())
        })?;

        if let Some(bits) = self.bit_depth {
            if !matches!(bits, 16 | 24 | 32) {
                return Err(OfflineError::InvalidConfig(format!(
                    "Unsupported bit depth: {}",
                    bits
                )));
            }
        }

        let output_path = resolve_output_path(&requested);
        if output_path != requested {
            log::warn!(
                "Output {} is not wav/flac, writing {}",
                requested.display(),
                output_path.display()
            );
        }

        let mut format = OutputFormat::for_path(&output_path);
        if let Some(bits) = self.bit_depth {
            format = format.with_bit_depth(bits);
        }
        if matches!(format, OutputFormat::Flac(_)) && format.bit_depth() == 32 {
            return Err(OfflineError::InvalidConfig(
                "FLAC output supports 16 or 24 bits".to_string(),
            ));
        }

        let id = JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        let name = self.name.unwrap_or_else(|| {
            input_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("Job {}", id))
        });

        Ok(SeparationJob {
            id,
            input_path,
            output_path,
            method: self.method.unwrap_or(SeparationMethod::VocalRemoval),
            quality: self.quality,
            format,
            name,
        })
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in queue
    Pending,
    /// Currently processing
    Processing,
    /// Completed successfully
    Completed,
    /// Failed with error
    Failed,
}

/// Job completion result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Output file path (if successful)
    pub output_path: Option<PathBuf>,
    /// Output file size in bytes
    pub output_size: u64,
    /// Wall-clock processing time
    pub duration: Duration,
    pub sample_rate: u32,
    pub frames: usize,
    /// Peak level of the written audio (dBFS)
    pub peak_db: f64,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(
        job_id: JobId,
        output_path: PathBuf,
        output_size: u64,
        duration: Duration,
        sample_rate: u32,
        frames: usize,
        peak_db: f64,
    ) -> Self {
        Self {
            job_id,
            status: JobStatus::Completed,
            output_path: Some(output_path),
            output_size,
            duration,
            sample_rate,
            frames,
            peak_db,
            error: None,
        }
    }

    pub fn failure(job_id: JobId, error: String, duration: Duration) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            output_path: None,
            output_size: 0,
            duration,
            sample_rate: 0,
            frames: 0,
            peak_db: f64::NEG_INFINITY,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_paths() {
        assert!(matches!(
            SeparationJob::builder().output("out.wav").build(),
            Err(OfflineError::InvalidConfig(_))
        ));
        assert!(matches!(
            SeparationJob::builder().input("in.wav").build(),
            Err(OfflineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let job = SeparationJob::builder()
            .input("songs/track.mp3")
            .output("out/track.wav")
            .build()
            .unwrap();

        assert_eq!(job.method, SeparationMethod::VocalRemoval);
        assert_eq!(job.quality, QualityLevel::Medium);
        assert_eq!(job.format, OutputFormat::wav_16());
        assert_eq!(job.name, "track");
    }

    #[test]
    fn test_builder_extension_fallback() {
        let job = SeparationJob::builder()
            .input("in.wav")
            .output("out.ogg")
            .bit_depth(24)
            .build()
            .unwrap();

        assert_eq!(job.output_path, PathBuf::from("out.wav"));
        assert_eq!(job.format, OutputFormat::wav_24());
    }

    #[test]
    fn test_builder_flac() {
        let job = SeparationJob::builder()
            .input("in.wav")
            .output("out.flac")
            .method(SeparationMethod::HarmonicPercussive)
            .quality(QualityLevel::High)
            .build()
            .unwrap();

        assert_eq!(job.format.extension(), "flac");
        assert_eq!(job.method, SeparationMethod::HarmonicPercussive);
    }

    #[test]
    fn test_builder_rejects_bit_depth() {
        assert!(
            SeparationJob::builder()
                .input("in.wav")
                .output("out.wav")
                .bit_depth(20)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_unique_ids() {
        let a = SeparationJob::builder().input("a.wav").output("a_out.wav").build().unwrap();
        let b = SeparationJob::builder().input("b.wav").output("b_out.wav").build().unwrap();
        assert_ne!(a.id, b.id);
    }
}
