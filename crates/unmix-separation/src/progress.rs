//! Progress reporting
//!
//! A [`ProgressSink`] receives fractions in `[0.0, 1.0]`. The engine wraps
//! the caller's sink in [`MonotonicProgress`] so values never go backwards,
//! and hands each stage a [`ScaledProgress`] mapping the stage's own
//! `0..1` onto its slice of the overall call.

/// Receiver of completion fractions
pub trait ProgressSink {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// Clamps to `[0, 1]` and drops regressions (re-emitting the last value)
pub struct MonotonicProgress<'a> {
    inner: &'a mut dyn ProgressSink,
    last: f64,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(inner: &'a mut dyn ProgressSink) -> Self {
        Self { inner, last: 0.0 }
    }
}

impl ProgressSink for MonotonicProgress<'_> {
    fn report(&mut self, fraction: f64) {
        let value = if fraction.is_nan() {
            self.last
        } else {
            fraction.clamp(0.0, 1.0).max(self.last)
        };
        self.last = value;
        self.inner.report(value);
    }
}

/// Maps `0..1` onto `start..end` of an outer sink
pub struct ScaledProgress<'a> {
    inner: &'a mut dyn ProgressSink,
    start: f64,
    end: f64,
}

impl<'a> ScaledProgress<'a> {
    pub fn new(inner: &'a mut dyn ProgressSink, start: f64, end: f64) -> Self {
        Self { inner, start, end }
    }
}

impl ProgressSink for ScaledProgress<'_> {
    fn report(&mut self, fraction: f64) {
        let f = fraction.clamp(0.0, 1.0);
        self.inner.report(self.start + f * (self.end - self.start));
    }
}
