//! Frame-level signal features
//!
//! Time-domain features use centered frames: the signal is padded by half a
//! frame on each side and frame `t` starts at `t * hop` in the padded
//! signal, giving `1 + len / hop` frames. Spectral features work on a
//! magnitude spectrogram (bins x frames) from [`stft`](crate::stft).

use ndarray::Array2;
use unmix_core::Sample;

/// Default analysis frame length (samples)
pub const FRAME_LENGTH: usize = 2048;
/// Default analysis hop (samples)
pub const HOP_LENGTH: usize = 512;

/// Amplitudes at or below this count as zero for crossing detection
const ZERO_THRESHOLD: f64 = 1e-10;

// ============ Framing ============

/// Number of centered frames over `len` samples
#[inline]
pub fn centered_frame_count(len: usize, hop: usize) -> usize {
    if len == 0 || hop == 0 { 0 } else { 1 + len / hop }
}

/// Apply `per_frame` to each zero-padded centered frame
fn centered_frames<F>(signal: &[Sample], frame_length: usize, hop: usize, mut per_frame: F) -> Vec<f64>
where
    F: FnMut(&mut dyn Iterator<Item = Sample>) -> f64,
{
    let len = signal.len() as isize;
    let half = (frame_length / 2) as isize;
    (0..centered_frame_count(signal.len(), hop))
        .map(|t| {
            let origin = (t * hop) as isize - half;
            let mut samples = (0..frame_length as isize).map(|i| {
                let idx = origin + i;
                if idx < 0 || idx >= len { 0.0 } else { signal[idx as usize] }
            });
            per_frame(&mut samples)
        })
        .collect()
}

/// Per-frame RMS over zero-padded centered frames
pub fn frame_rms(signal: &[Sample], frame_length: usize, hop: usize) -> Vec<f64> {
    if frame_length == 0 {
        return Vec::new();
    }
    centered_frames(signal, frame_length, hop, |frame| {
        let sum_sq: f64 = frame.map(|s| s * s).sum();
        (sum_sq / frame_length as f64).sqrt()
    })
}

/// Per-frame fraction of sign changes.
///
/// Frames are centered with edge padding (the first and last sample are
/// repeated). Near-zero samples count as positive.
pub fn zero_crossing_rate(signal: &[Sample], frame_length: usize, hop: usize) -> Vec<f64> {
    if signal.is_empty() || frame_length == 0 || hop == 0 {
        return Vec::new();
    }
    let last = signal.len() - 1;
    let half = (frame_length / 2) as isize;
    let negative = |x: f64| x < -ZERO_THRESHOLD;

    (0..centered_frame_count(signal.len(), hop))
        .map(|t| {
            let origin = (t * hop) as isize - half;
            let at = |i: isize| signal[(origin + i).clamp(0, last as isize) as usize];
            let crossings = (1..frame_length as isize)
                .filter(|&i| negative(at(i)) != negative(at(i - 1)))
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

// ============ Spectral ============

/// Center frequency of each STFT bin
pub fn bin_frequencies(sample_rate: u32, fft_size: usize) -> Vec<f64> {
    let bins = fft_size / 2 + 1;
    (0..bins)
        .map(|k| k as f64 * sample_rate as f64 / fft_size as f64)
        .collect()
}

/// Magnitude-weighted mean frequency per frame (0 for silent frames)
pub fn spectral_centroid(magnitude: &Array2<f64>, sample_rate: u32, fft_size: usize) -> Vec<f64> {
    let freqs = bin_frequencies(sample_rate, fft_size);
    magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let total: f64 = col.sum();
            if total <= 0.0 {
                return 0.0;
            }
            col.iter().zip(&freqs).map(|(m, f)| m * f).sum::<f64>() / total
        })
        .collect()
}

/// Magnitude-weighted standard deviation around the centroid, per frame
pub fn spectral_bandwidth(
    magnitude: &Array2<f64>,
    sample_rate: u32,
    fft_size: usize,
    centroid: &[f64],
) -> Vec<f64> {
    let freqs = bin_frequencies(sample_rate, fft_size);
    magnitude
        .columns()
        .into_iter()
        .zip(centroid)
        .map(|(col, &c)| {
            let total: f64 = col.sum();
            if total <= 0.0 {
                return 0.0;
            }
            col.iter()
                .zip(&freqs)
                .map(|(m, f)| (m / total) * (f - c).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}

/// Lowest bin frequency below which `roll_percent` of the frame's
/// magnitude lies (0 for silent frames)
pub fn spectral_rolloff(
    magnitude: &Array2<f64>,
    sample_rate: u32,
    fft_size: usize,
    roll_percent: f64,
) -> Vec<f64> {
    let freqs = bin_frequencies(sample_rate, fft_size);
    magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let total: f64 = col.sum();
            if total <= 0.0 {
                return 0.0;
            }
            let target = roll_percent * total;
            let mut acc = 0.0;
            for (m, &f) in col.iter().zip(&freqs) {
                acc += m;
                if acc >= target {
                    return f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

// ============ Chroma ============

/// Pitch class (0 = C) of a frequency, by nearest equal-tempered semitone
#[inline]
fn pitch_class(freq: f64) -> usize {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    (midi.round() as i64).rem_euclid(12) as usize
}

/// Per-frame 12-bin chroma from a magnitude spectrogram.
///
/// Bin power is folded onto the nearest pitch class; each frame is scaled
/// so its largest class is 1 (silent frames stay zero).
pub fn chroma(magnitude: &Array2<f64>, sample_rate: u32, fft_size: usize) -> Vec<[f64; 12]> {
    let classes: Vec<Option<usize>> = bin_frequencies(sample_rate, fft_size)
        .into_iter()
        .map(|f| (f > 0.0).then(|| pitch_class(f)))
        .collect();

    magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let mut frame = [0.0; 12];
            for (m, class) in col.iter().zip(&classes) {
                if let Some(c) = class {
                    frame[*c] += m * m;
                }
            }
            let max = frame.iter().copied().fold(0.0, f64::max);
            if max > 0.0 {
                frame.iter_mut().for_each(|v| *v /= max);
            }
            frame
        })
        .collect()
}

/// Mean of a feature track (0 when empty)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stft::stft;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine(freq: f64, len: usize, sr: u32) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sr as f64).sin())
            .collect()
    }

    #[test]
    fn test_frame_rms_centered() {
        let signal = vec![1.0; 4096];
        let rms = frame_rms(&signal, 2048, 512);
        assert_eq!(rms.len(), 1 + 4096 / 512);
        // first frame is half padding
        assert_relative_eq!(rms[0], 0.5f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(rms[4], 1.0, epsilon = 1e-12);
        assert!(frame_rms(&[], 2048, 512).is_empty());
    }

    #[test]
    fn test_zero_crossing_rate() {
        // alternating sign: every step crosses
        let alt: Vec<f64> = (0..8192).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let zcr = zero_crossing_rate(&alt, 2048, 512);
        assert_relative_eq!(zcr[4], 2047.0 / 2048.0, epsilon = 1e-12);

        let dc = vec![0.3; 8192];
        assert!(zero_crossing_rate(&dc, 2048, 512).iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_centroid_of_pure_tone() {
        let sr = 22050;
        let spec = stft(&sine(1000.0, sr as usize, sr), 2048, 512).unwrap();
        let mag = spec.magnitude();
        let mid = mag.ncols() / 2;
        let centroid = spectral_centroid(&mag, sr, 2048);
        assert!((centroid[mid] - 1000.0).abs() < 20.0);

        let bandwidth = spectral_bandwidth(&mag, sr, 2048, &centroid);
        assert!(bandwidth[mid] < 100.0);

        let rolloff = spectral_rolloff(&mag, sr, 2048, 0.85);
        assert!((rolloff[mid] - 1000.0).abs() < 25.0);
    }

    #[test]
    fn test_silent_spectrum_features_are_zero() {
        let mag = Array2::<f64>::zeros((1025, 4));
        assert!(spectral_centroid(&mag, 44100, 2048).iter().all(|&c| c == 0.0));
        assert!(spectral_rolloff(&mag, 44100, 2048, 0.85).iter().all(|&c| c == 0.0));
        assert!(chroma(&mag, 44100, 2048).iter().all(|f| f.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_chroma_finds_pitch_class() {
        let sr = 22050;
        // A4 -> class 9
        let spec = stft(&sine(440.0, sr as usize, sr), 4096, 1024).unwrap();
        let frames = chroma(&spec.magnitude(), sr, 4096);
        let mid = frames[frames.len() / 2];
        assert_eq!(mid[9], 1.0);
        assert_eq!(pitch_class(261.63), 0);
    }
}
