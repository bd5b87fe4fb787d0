//! Butterworth filter design and zero-phase filtering
//!
//! Design follows the classic chain: analog prototype poles, frequency
//! transform (lowpass / highpass / bandpass / bandstop), prewarped bilinear
//! transform, then pairing into second-order sections. Sections run as
//! Transposed Direct Form II biquads.
//!
//! Edge frequencies are normalized to Nyquist and clamped to `[0.01, 0.99]`.
//! A band whose clamped low edge is not below its high edge yields the
//! identity filter.

use std::f64::consts::PI;

use num_complex::Complex64;
use unmix_core::Sample;

/// Filter order used when callers have no preference
pub const DEFAULT_ORDER: usize = 5;

const EDGE_MIN: f64 = 0.01;
const EDGE_MAX: f64 = 0.99;

/// Sampling rate of the normalized design domain (Nyquist = 1)
const DESIGN_FS: f64 = 2.0;

/// Imaginary parts below this are treated as real roots
const REAL_ROOT_TOL: f64 = 1e-10;

// ============ Biquad Section ============

/// Second-order section coefficients, normalized so `a0 == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    fn from_factors(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }

    /// Gain at 0 Hz
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// State after settling on a unit step input
    fn step_state(&self) -> [f64; 2] {
        let y = self.dc_gain();
        [y - self.b0, self.b2 - self.a2 * y]
    }

    /// Complex response at normalized angular frequency `omega`
    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        (self.b0 + z1 * self.b1 + z2 * self.b2) / (1.0 + z1 * self.a1 + z2 * self.a2)
    }

    #[inline(always)]
    fn tick(&self, state: &mut [f64; 2], input: Sample) -> Sample {
        let output = self.b0 * input + state[0];
        state[0] = self.b1 * input - self.a1 * output + state[1];
        state[1] = self.b2 * input - self.a2 * output;
        output
    }
}

// ============ Filter ============

/// Cascade of second-order sections
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    sections: Vec<BiquadCoeffs>,
}

impl Filter {
    /// Pass-through filter with no sections
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: Vec<BiquadCoeffs>) -> Self {
        Self { sections }
    }

    pub fn is_identity(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate as f64;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Causal filtering from rest
    pub fn process(&self, signal: &[Sample]) -> Vec<Sample> {
        let mut out = signal.to_vec();
        let mut states = vec![[0.0; 2]; self.sections.len()];
        self.run(&mut out, &mut states);
        out
    }

    fn run(&self, buffer: &mut [Sample], states: &mut [[f64; 2]]) {
        for (section, state) in self.sections.iter().zip(states.iter_mut()) {
            for s in buffer.iter_mut() {
                *s = section.tick(state, *s);
            }
        }
    }

    /// Per-section initial state for a unit step, each section scaled by the
    /// DC gain of the sections before it.
    fn step_states(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.step_state();
                let state = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }
}

// ============ Zero-phase filtering ============

/// Forward-backward filtering with odd-extension padding.
///
/// Output has zero phase distortion and the squared magnitude response of
/// `filter`.
pub fn filtfilt(filter: &Filter, signal: &[Sample]) -> Vec<Sample> {
    if filter.is_identity() || signal.is_empty() {
        return signal.to_vec();
    }

    let len = signal.len();
    let pad = (3 * (2 * filter.sections.len() + 1)).min(len - 1);
    let mut ext = odd_extension(signal, pad);
    let zi = filter.step_states();

    let x0 = ext[0];
    let mut states: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();
    filter.run(&mut ext, &mut states);

    ext.reverse();
    let y0 = ext[0];
    let mut states: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * y0, z[1] * y0]).collect();
    filter.run(&mut ext, &mut states);
    ext.reverse();

    ext[pad..pad + len].to_vec()
}

fn odd_extension(signal: &[Sample], pad: usize) -> Vec<Sample> {
    let len = signal.len();
    let first = signal[0];
    let last = signal[len - 1];

    let mut ext = Vec::with_capacity(len + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    ext.extend_from_slice(signal);
    ext.extend((1..=pad).map(|i| 2.0 * last - signal[len - 1 - i]));
    ext
}

// ============ Design ============

/// Butterworth lowpass
pub fn design_lowpass(sample_rate: u32, cutoff_hz: f64, order: usize) -> Filter {
    let Some(wn) = normalized_edge(cutoff_hz, sample_rate) else {
        return Filter::identity();
    };
    if order == 0 {
        return Filter::identity();
    }
    let wo = prewarp(wn);
    prototype(order).lowpass(wo).bilinear().into_filter()
}

/// Butterworth highpass
pub fn design_highpass(sample_rate: u32, cutoff_hz: f64, order: usize) -> Filter {
    let Some(wn) = normalized_edge(cutoff_hz, sample_rate) else {
        return Filter::identity();
    };
    if order == 0 {
        return Filter::identity();
    }
    let wo = prewarp(wn);
    prototype(order).highpass(wo).bilinear().into_filter()
}

/// Butterworth bandpass over `[low_hz, high_hz]`
pub fn design_bandpass(sample_rate: u32, low_hz: f64, high_hz: f64, order: usize) -> Filter {
    match band_edges(sample_rate, low_hz, high_hz, order) {
        Some((wo, bw)) => prototype(order).bandpass(wo, bw).bilinear().into_filter(),
        None => Filter::identity(),
    }
}

/// Butterworth bandstop over `[low_hz, high_hz]`
pub fn design_bandstop(sample_rate: u32, low_hz: f64, high_hz: f64, order: usize) -> Filter {
    match band_edges(sample_rate, low_hz, high_hz, order) {
        Some((wo, bw)) => prototype(order).bandstop(wo, bw).bilinear().into_filter(),
        None => Filter::identity(),
    }
}

fn normalized_edge(freq_hz: f64, sample_rate: u32) -> Option<f64> {
    if sample_rate == 0 || !freq_hz.is_finite() {
        log::debug!("Filter edge {} Hz at {} Hz unusable, using identity", freq_hz, sample_rate);
        return None;
    }
    let nyquist = sample_rate as f64 / 2.0;
    Some((freq_hz / nyquist).clamp(EDGE_MIN, EDGE_MAX))
}

/// Prewarped analog center frequency and bandwidth, or `None` for a
/// degenerate band
fn band_edges(sample_rate: u32, low_hz: f64, high_hz: f64, order: usize) -> Option<(f64, f64)> {
    let low = normalized_edge(low_hz, sample_rate)?;
    let high = normalized_edge(high_hz, sample_rate)?;
    if low >= high || order == 0 {
        log::debug!(
            "Degenerate filter band [{:.4}, {:.4}] (order {}), using identity",
            low,
            high,
            order
        );
        return None;
    }
    let wl = prewarp(low);
    let wh = prewarp(high);
    Some(((wl * wh).sqrt(), wh - wl))
}

#[inline]
fn prewarp(wn: f64) -> f64 {
    2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan()
}

fn product<'a>(roots: impl IntoIterator<Item = &'a Complex64>) -> Complex64 {
    roots
        .into_iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &r| acc * r)
}

/// Zeros, poles and gain of a transfer function
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Analog Butterworth prototype with cutoff 1 rad/s
fn prototype(order: usize) -> Zpk {
    let n = order as i64;
    let poles = (-(n - 1)..=(n - 1))
        .step_by(2)
        .map(|m| -Complex64::from_polar(1.0, PI * m as f64 / (2.0 * order as f64)))
        .collect();
    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

impl Zpk {
    fn degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }

    fn neg_ratio(&self) -> f64 {
        let num = product(&self.zeros.iter().map(|&z| -z).collect::<Vec<_>>());
        let den = product(&self.poles.iter().map(|&p| -p).collect::<Vec<_>>());
        (num / den).re
    }

    fn lowpass(self, wo: f64) -> Self {
        let degree = self.degree() as i32;
        Self {
            zeros: self.zeros.iter().map(|&z| z * wo).collect(),
            poles: self.poles.iter().map(|&p| p * wo).collect(),
            gain: self.gain * wo.powi(degree),
        }
    }

    fn highpass(self, wo: f64) -> Self {
        let degree = self.degree();
        let gain = self.gain * self.neg_ratio();
        let mut zeros: Vec<Complex64> = self.zeros.iter().map(|&z| wo / z).collect();
        zeros.extend(std::iter::repeat_n(Complex64::new(0.0, 0.0), degree));
        Self {
            zeros,
            poles: self.poles.iter().map(|&p| wo / p).collect(),
            gain,
        }
    }

    fn bandpass(self, wo: f64, bw: f64) -> Self {
        let degree = self.degree();
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let scaled: Vec<Complex64> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
            let upper = scaled.iter().map(|&r| r + (r * r - wo * wo).sqrt());
            let lower = scaled.iter().map(|&r| r - (r * r - wo * wo).sqrt());
            upper.chain(lower).collect()
        };
        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat_n(Complex64::new(0.0, 0.0), degree));
        Self {
            zeros,
            poles: split(&self.poles),
            gain: self.gain * bw.powi(degree as i32),
        }
    }

    fn bandstop(self, wo: f64, bw: f64) -> Self {
        let degree = self.degree();
        let gain = self.gain * self.neg_ratio();
        let split = |roots: &[Complex64]| -> Vec<Complex64> {
            let inverted: Vec<Complex64> = roots.iter().map(|&r| (bw / 2.0) / r).collect();
            let upper = inverted.iter().map(|&r| r + (r * r - wo * wo).sqrt());
            let lower = inverted.iter().map(|&r| r - (r * r - wo * wo).sqrt());
            upper.chain(lower).collect()
        };
        let mut zeros = split(&self.zeros);
        zeros.extend(std::iter::repeat_n(Complex64::new(0.0, wo), degree));
        zeros.extend(std::iter::repeat_n(Complex64::new(0.0, -wo), degree));
        Self {
            zeros,
            poles: split(&self.poles),
            gain,
        }
    }

    /// Analog -> digital, with the design-domain sampling rate
    fn bilinear(self) -> Self {
        let fs2 = 2.0 * DESIGN_FS;
        let degree = self.degree();
        let map = |&r: &Complex64| (fs2 + r) / (fs2 - r);

        let num = product(&self.zeros.iter().map(|&z| fs2 - z).collect::<Vec<_>>());
        let den = product(&self.poles.iter().map(|&p| fs2 - p).collect::<Vec<_>>());

        let mut zeros: Vec<Complex64> = self.zeros.iter().map(map).collect();
        zeros.extend(std::iter::repeat_n(Complex64::new(-1.0, 0.0), degree));
        Self {
            zeros,
            poles: self.poles.iter().map(map).collect(),
            gain: self.gain * (num / den).re,
        }
    }

    /// Pair roots into second-order sections; gain goes on the first section
    fn into_filter(self) -> Filter {
        let mut pole_factors = root_factors(&self.poles);
        // Most resonant sections last
        let resonant_tail = pole_factors.len() - usize::from(self.poles.len() % 2 == 1);
        pole_factors[..resonant_tail].sort_by(|a, b| a[2].abs().total_cmp(&b[2].abs()));

        let zero_factors = root_factors(&self.zeros);
        let mut sections = Vec::with_capacity(pole_factors.len());
        for (i, a) in pole_factors.iter().enumerate() {
            let mut b = zero_factors.get(i).copied().unwrap_or([1.0, 0.0, 0.0]);
            if i == 0 {
                b.iter_mut().for_each(|c| *c *= self.gain);
            }
            sections.push(BiquadCoeffs::from_factors(b, *a));
        }
        Filter::from_sections(sections)
    }
}

/// Polynomial factors `[1, c1, c2]` for a set of roots closed under
/// conjugation. Conjugate pairs come first, then real roots paired
/// outermost-first; an unpaired real root becomes a trailing first-order
/// factor.
fn root_factors(roots: &[Complex64]) -> Vec<[f64; 3]> {
    let mut factors = Vec::new();
    let mut reals = Vec::new();

    for r in roots {
        if r.im.abs() <= REAL_ROOT_TOL {
            reals.push(r.re);
        } else if r.im > 0.0 {
            factors.push([1.0, -2.0 * r.re, r.norm_sqr()]);
        }
    }

    reals.sort_by(f64::total_cmp);
    let mut lo = 0;
    let mut hi = reals.len();
    while hi - lo >= 2 {
        let (a, b) = (reals[lo], reals[hi - 1]);
        factors.push([1.0, -(a + b), a * b]);
        lo += 1;
        hi -= 1;
    }
    if hi - lo == 1 {
        factors.push([1.0, -reals[lo], 0.0]);
    }
    factors
}
