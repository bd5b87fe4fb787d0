//! File round trips through decoder, encoders and the job pipeline

use std::f64::consts::PI;
use std::path::Path;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use unmix_core::AudioBuffer;
use unmix_offline::{
    AudioDecoder, AudioTags, JobStatus, OfflineError, OutputFormat, SeparationJob, run_job, write_output,
};
use unmix_separation::{NoProgress, QualityLevel, SeparationEngine, SeparationMethod};

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const SR: u32 = 22050;

fn two_tone(frames: usize) -> AudioBuffer {
    let left = (0..frames)
        .map(|i| 0.4 * (2.0 * PI * 220.0 * i as f64 / SR as f64).sin())
        .collect();
    let right = (0..frames)
        .map(|i| 0.3 * (2.0 * PI * 330.0 * i as f64 / SR as f64).sin())
        .collect();
    AudioBuffer::from_stereo(left, right, SR).unwrap()
}

fn write_input(dir: &Path, name: &str, frames: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    write_output(&path, &two_tone(frames), &OutputFormat::wav_32f()).unwrap();
    path
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODE / DECODE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_wav_float_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    let original = two_tone(5000);

    write_output(&path, &original, &OutputFormat::wav_32f()).unwrap();
    let decoded = AudioDecoder::decode(&path).unwrap();

    assert_eq!(decoded.num_channels(), 2);
    assert_eq!(decoded.frames(), 5000);
    assert_eq!(decoded.sample_rate(), SR);
    for ch in 0..2 {
        let a = original.channel(ch).unwrap();
        let b = decoded.channel(ch).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_wav_16_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone16.wav");
    let original = two_tone(3000);

    write_output(&path, &original, &OutputFormat::wav_16()).unwrap();
    let decoded = AudioDecoder::decode(&path).unwrap();

    assert_eq!(decoded.frames(), 3000);
    let a = original.channel(0).unwrap();
    let b = decoded.channel(0).unwrap();
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-3);
    }
}

#[test]
fn test_flac_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.flac");
    let original = two_tone(8000);

    write_output(&path, &original, &OutputFormat::flac()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"fLaC");

    let decoded = AudioDecoder::decode(&path).unwrap();
    assert_eq!(decoded.num_channels(), 2);
    assert_eq!(decoded.frames(), 8000);
    assert_abs_diff_eq!(decoded.peak(), original.peak(), epsilon = 1e-3);
}

#[test]
fn test_probe_and_validate() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), "probe.wav", SR as usize);

    let info = AudioDecoder::probe(&path).unwrap();
    assert_eq!(info.sample_rate, SR);
    assert_eq!(info.channels, 2);
    assert_eq!(info.bit_depth, 32);
    assert_eq!(info.frames, SR as usize);
    assert_abs_diff_eq!(info.duration, 1.0, epsilon = 1e-9);
    assert_eq!(info.file_size, std::fs::metadata(&path).unwrap().len());
    // hound writes no INFO chunk
    assert_eq!(info.tags, AudioTags::default());

    assert!(AudioDecoder::validate(&path));

    let garbage = dir.path().join("garbage.wav");
    std::fs::write(&garbage, b"definitely not audio").unwrap();
    assert!(!AudioDecoder::validate(&garbage));
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOBS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_job_every_method() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mix.wav", 4000);
    let engine = SeparationEngine::new();

    for method in SeparationMethod::DSP {
        let job = SeparationJob::builder()
            .input(&input)
            .output(dir.path().join(format!("{}.wav", method)))
            .method(method)
            .quality(QualityLevel::Low)
            .build()
            .unwrap();

        let mut seen = Vec::new();
        let result = run_job(&engine, &job, &mut |p: f64| seen.push(p)).unwrap();

        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.frames, 4000);
        assert_eq!(result.sample_rate, SR);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{}: {:?}", method, seen);
        assert_eq!(seen.first().copied(), Some(0.0));
        assert_eq!(seen.last().copied(), Some(1.0));

        let written = AudioDecoder::decode(result.output_path.as_deref().unwrap()).unwrap();
        assert_eq!(written.num_channels(), 1);
        assert_eq!(written.frames(), 4000);
    }
}

#[test]
fn test_run_job_extension_fallback() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mix.wav", 2048);

    let job = SeparationJob::builder()
        .input(&input)
        .output(dir.path().join("out/karaoke.mp3"))
        .build()
        .unwrap();

    let result = run_job(&SeparationEngine::new(), &job, &mut NoProgress).unwrap();
    let path = result.output_path.unwrap();

    assert_eq!(path, dir.path().join("out/karaoke.wav"));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(result.output_size, bytes.len() as u64);
}

#[test]
fn test_run_job_flac_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "mix.wav", 3000);

    let job = SeparationJob::builder()
        .input(&input)
        .output(dir.path().join("layers.flac"))
        .method(SeparationMethod::HarmonicPercussive)
        .bit_depth(24)
        .build()
        .unwrap();

    let result = run_job(&SeparationEngine::new(), &job, &mut NoProgress).unwrap();
    let bytes = std::fs::read(result.output_path.unwrap()).unwrap();
    assert_eq!(&bytes[0..4], b"fLaC");
}

#[test]
fn test_run_job_missing_input() {
    let dir = TempDir::new().unwrap();
    let job = SeparationJob::builder()
        .input(dir.path().join("nope.wav"))
        .output(dir.path().join("out.wav"))
        .build()
        .unwrap();

    let err = run_job(&SeparationEngine::new(), &job, &mut NoProgress).unwrap_err();
    assert!(matches!(err, OfflineError::InputNotFound(_)));
    assert!(!dir.path().join("out.wav").exists());
}
