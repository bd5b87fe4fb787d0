//! Short-Time Fourier Transform
//!
//! Frames are centered: the signal is preceded by `fft_size / 2` zeros and
//! the tail is zero-padded so the last partial frame is complete. For a
//! signal of `len` samples and hop `h` there are `1 + ceil(len / h)` frames.
//!
//! The inverse is a windowed overlap-add normalized by the summed squared
//! window, which reconstructs the input exactly (to rounding) whenever the
//! spectrogram was not modified.

use std::f64::consts::PI;

use ndarray::{Array2, Zip};
use num_complex::Complex64;
use realfft::RealFftPlanner;

use crate::error::{DspError, DspResult};

/// Window-sum positions below this are left unnormalized
const WINDOW_SUM_FLOOR: f64 = 1e-10;

// ============ Spectrogram ============

/// Complex one-sided spectrogram, `bins x frames`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// `fft_size / 2 + 1` rows, one column per frame
    pub data: Array2<Complex64>,
    pub fft_size: usize,
    pub hop_size: usize,
}

impl Spectrogram {
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.data.ncols()
    }

    pub fn magnitude(&self) -> Array2<f64> {
        self.data.mapv(|c| c.norm())
    }

    pub fn phase(&self) -> Array2<f64> {
        self.data.mapv(|c| c.arg())
    }

    /// Split into `(magnitude, phase)`
    pub fn magphase(&self) -> (Array2<f64>, Array2<f64>) {
        (self.magnitude(), self.phase())
    }

    /// Recombine magnitude and phase into a spectrogram
    pub fn from_polar(
        magnitude: &Array2<f64>,
        phase: &Array2<f64>,
        fft_size: usize,
        hop_size: usize,
    ) -> DspResult<Self> {
        validate(fft_size, hop_size)?;
        let bins = fft_size / 2 + 1;
        check_shape((bins, magnitude.ncols()), magnitude.dim())?;
        check_shape(magnitude.dim(), phase.dim())?;

        let data = Zip::from(magnitude)
            .and(phase)
            .map_collect(|&m, &p| Complex64::from_polar(m, p));

        Ok(Self {
            data,
            fft_size,
            hop_size,
        })
    }

    /// Multiply every bin by a real mask of the same shape
    pub fn masked(&self, mask: &Array2<f64>) -> DspResult<Self> {
        check_shape(self.data.dim(), mask.dim())?;
        let data = Zip::from(&self.data)
            .and(mask)
            .map_collect(|&c, &m| c * m);
        Ok(Self {
            data,
            fft_size: self.fft_size,
            hop_size: self.hop_size,
        })
    }
}

fn check_shape(expected: (usize, usize), got: (usize, usize)) -> DspResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(DspError::ShapeMismatch { expected, got })
    }
}

fn validate(fft_size: usize, hop_size: usize) -> DspResult<()> {
    if fft_size < 2 || fft_size % 2 != 0 {
        return Err(DspError::InvalidFftSize(fft_size));
    }
    if hop_size == 0 || hop_size > fft_size {
        return Err(DspError::InvalidHopSize {
            hop: hop_size,
            fft_size,
        });
    }
    Ok(())
}

// ============ Window ============

/// Periodic Hann window (DFT-even), as used for spectral analysis
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}

/// Frames needed to cover `len` samples at hop `hop`
#[inline]
pub fn frame_count(len: usize, hop: usize) -> usize {
    1 + len.div_ceil(hop)
}

// ============ Forward ============

/// Centered STFT of `signal`
pub fn stft(signal: &[f64], fft_size: usize, hop_size: usize) -> DspResult<Spectrogram> {
    validate(fft_size, hop_size)?;

    let n_frames = frame_count(signal.len(), hop_size);
    let pad = fft_size / 2;
    let padded_len = (n_frames - 1) * hop_size + fft_size;

    let mut padded = vec![0.0; padded_len];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let window = hann_window(fft_size);
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(fft_size);
    let mut frame = r2c.make_input_vec();
    let mut spectrum = r2c.make_output_vec();
    let mut scratch = r2c.make_scratch_vec();

    let bins = fft_size / 2 + 1;
    let mut data = Array2::<Complex64>::zeros((bins, n_frames));

    for t in 0..n_frames {
        let start = t * hop_size;
        for (i, (dst, &w)) in frame.iter_mut().zip(&window).enumerate() {
            *dst = padded[start + i] * w;
        }
        r2c.process_with_scratch(&mut frame, &mut spectrum, &mut scratch)
            .map_err(|e| DspError::Fft(e.to_string()))?;
        data.column_mut(t)
            .iter_mut()
            .zip(&spectrum)
            .for_each(|(dst, &c)| *dst = c);
    }

    log::trace!(
        "stft: {} samples -> {} bins x {} frames",
        signal.len(),
        bins,
        n_frames
    );

    Ok(Spectrogram {
        data,
        fft_size,
        hop_size,
    })
}

// ============ Inverse ============

/// Inverse STFT; output has `(frames - 1) * hop` samples
pub fn istft(spec: &Spectrogram) -> DspResult<Vec<f64>> {
    let fft_size = spec.fft_size;
    let hop_size = spec.hop_size;
    validate(fft_size, hop_size)?;

    let bins = fft_size / 2 + 1;
    let n_frames = spec.num_frames();
    check_shape((bins, n_frames), spec.data.dim())?;
    if n_frames == 0 {
        return Ok(Vec::new());
    }

    let window = hann_window(fft_size);
    let mut planner = RealFftPlanner::<f64>::new();
    let c2r = planner.plan_fft_inverse(fft_size);
    let mut spectrum = c2r.make_input_vec();
    let mut frame = c2r.make_output_vec();
    let mut scratch = c2r.make_scratch_vec();

    let padded_len = (n_frames - 1) * hop_size + fft_size;
    let mut output = vec![0.0; padded_len];
    let mut window_sum = vec![0.0; padded_len];
    let norm = 1.0 / fft_size as f64;

    for t in 0..n_frames {
        spectrum
            .iter_mut()
            .zip(spec.data.column(t))
            .for_each(|(dst, &c)| *dst = c);
        // A real signal has purely real DC and Nyquist bins
        spectrum[0].im = 0.0;
        spectrum[bins - 1].im = 0.0;

        c2r.process_with_scratch(&mut spectrum, &mut frame, &mut scratch)
            .map_err(|e| DspError::Fft(e.to_string()))?;

        let start = t * hop_size;
        for (i, (&s, &w)) in frame.iter().zip(&window).enumerate() {
            output[start + i] += s * norm * w;
            window_sum[start + i] += w * w;
        }
    }

    for (s, &ws) in output.iter_mut().zip(&window_sum) {
        if ws > WINDOW_SUM_FLOOR {
            *s /= ws;
        }
    }

    let pad = fft_size / 2;
    let len = (n_frames - 1) * hop_size;
    Ok(output[pad..pad + len].to_vec())
}

/// Inverse STFT trimmed or zero-padded to exactly `length` samples
pub fn istft_with_length(spec: &Spectrogram, length: usize) -> DspResult<Vec<f64>> {
    let mut out = istft(spec)?;
    out.resize(length, 0.0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_signal(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / 44100.0;
                0.5 * (2.0 * PI * 440.0 * t).sin() + 0.2 * (2.0 * PI * 3000.0 * t).cos()
            })
            .collect()
    }

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert_relative_eq!(w[4], 1.0, epsilon = 1e-15);
        // Periodic: w[1] == w[7]
        assert_relative_eq!(w[1], w[7], epsilon = 1e-15);
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(0, 512), 1);
        assert_eq!(frame_count(512, 512), 2);
        assert_eq!(frame_count(513, 512), 3);
    }

    #[test]
    fn test_stft_shape() {
        let spec = stft(&test_signal(5000), 1024, 256).unwrap();
        assert_eq!(spec.num_bins(), 513);
        assert_eq!(spec.num_frames(), 1 + 5000_usize.div_ceil(256));
    }

    #[test]
    fn test_round_trip() {
        let signal = test_signal(10_000);
        let spec = stft(&signal, 2048, 512).unwrap();
        let out = istft_with_length(&spec, signal.len()).unwrap();

        for (a, b) in signal.iter().zip(&out) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_istft_length_is_hop_multiple() {
        let spec = stft(&test_signal(1000), 1024, 512).unwrap();
        assert_eq!(istft(&spec).unwrap().len(), 1024);
    }

    #[test]
    fn test_magphase_recompose() {
        let spec = stft(&test_signal(4096), 1024, 256).unwrap();
        let (mag, phase) = spec.magphase();
        let rebuilt = Spectrogram::from_polar(&mag, &phase, 1024, 256).unwrap();

        for (a, b) in spec.data.iter().zip(rebuilt.data.iter()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-9);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(stft(&[0.0; 10], 0, 1).unwrap_err(), DspError::InvalidFftSize(0));
        assert_eq!(stft(&[0.0; 10], 1023, 256).unwrap_err(), DspError::InvalidFftSize(1023));
        assert!(matches!(
            stft(&[0.0; 10], 1024, 2048),
            Err(DspError::InvalidHopSize { .. })
        ));
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let spec = stft(&[0.0; 100], 256, 64).unwrap();
        let mask = Array2::<f64>::ones((3, 3));
        assert!(matches!(
            spec.masked(&mask),
            Err(DspError::ShapeMismatch { .. })
        ));
    }
}
