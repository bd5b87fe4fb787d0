//! Separation engine façade
//!
//! Validates and conditions the input, resolves the quality tier, picks a
//! backend and drives progress across the whole call:
//!
//! | Stage        | Progress    |
//! |--------------|-------------|
//! | conditioning | 0.0 .. 0.2  |
//! | method       | 0.2 .. 0.9  |
//! | finalize     | 0.9 .. 1.0  |

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use unmix_core::AudioBuffer;

use crate::config::EngineConfig;
use crate::error::{SeparationError, SeparationResult};
use crate::progress::{MonotonicProgress, ProgressSink, ScaledProgress};
use crate::quality::QualityLevel;
use crate::separation::{DspBackend, SeparationBackend, StemTarget};

const CONDITIONING_END: f64 = 0.2;
const METHOD_END: f64 = 0.9;

/// Separation method selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeparationMethod {
    VocalRemoval,
    InstrumentalIsolation,
    HarmonicPercussive,
    /// Stem from a neural model backend
    Neural(StemTarget),
}

impl SeparationMethod {
    /// Methods that need no model
    pub const DSP: [SeparationMethod; 3] = [
        SeparationMethod::VocalRemoval,
        SeparationMethod::InstrumentalIsolation,
        SeparationMethod::HarmonicPercussive,
    ];

    pub fn is_neural(&self) -> bool {
        matches!(self, SeparationMethod::Neural(_))
    }

    pub fn description(&self) -> &'static str {
        match self {
            SeparationMethod::VocalRemoval => {
                "Center-channel removal with similarity masking and vocal-band notches"
            }
            SeparationMethod::InstrumentalIsolation => {
                "Stereo-widened mix with harmonic emphasis"
            }
            SeparationMethod::HarmonicPercussive => "Harmonic layer of the mono mixdown",
            SeparationMethod::Neural(_) => "Stem from a neural separation model",
        }
    }
}

impl fmt::Display for SeparationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparationMethod::VocalRemoval => f.write_str("vocal_removal"),
            SeparationMethod::InstrumentalIsolation => f.write_str("instrumental_isolation"),
            SeparationMethod::HarmonicPercussive => f.write_str("harmonic_percussive"),
            SeparationMethod::Neural(target) => write!(f, "neural:{}", target),
        }
    }
}

impl FromStr for SeparationMethod {
    type Err = SeparationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vocal_removal" => Ok(SeparationMethod::VocalRemoval),
            "instrumental_isolation" => Ok(SeparationMethod::InstrumentalIsolation),
            "harmonic_percussive" => Ok(SeparationMethod::HarmonicPercussive),
            other => match other.strip_prefix("neural:") {
                Some(stem) => stem
                    .parse()
                    .map(SeparationMethod::Neural)
                    .map_err(|_| SeparationError::InvalidMethod(other.to_string())),
                None => Err(SeparationError::InvalidMethod(other.to_string())),
            },
        }
    }
}

/// Dispatches separation requests to registered backends
pub struct SeparationEngine {
    backends: Vec<Box<dyn SeparationBackend>>,
}

impl Default for SeparationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SeparationEngine {
    /// Engine with the DSP backend and default constants
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            backends: vec![Box::new(DspBackend::new(config))],
        }
    }

    /// Engine with no backends at all
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with_backend<B: SeparationBackend + 'static>(mut self, backend: B) -> Self {
        self.register_backend(Box::new(backend));
        self
    }

    pub fn register_backend(&mut self, backend: Box<dyn SeparationBackend>) {
        log::debug!("Registered backend '{}'", backend.name());
        self.backends.push(backend);
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn supports(&self, method: &SeparationMethod) -> bool {
        self.backends.iter().any(|b| b.supports(method))
    }

    /// Parse both selectors, then [`process`](Self::process).
    ///
    /// Unknown methods fail with `InvalidMethod`; unknown qualities fall
    /// back to [`QualityLevel::PERMISSIVE_DEFAULT`].
    pub fn process_str(
        &self,
        buffer: &AudioBuffer,
        method: &str,
        quality: &str,
        progress: &mut dyn ProgressSink,
    ) -> SeparationResult<(AudioBuffer, u32)> {
        let method: SeparationMethod = method.parse()?;
        self.process(buffer, &method, QualityLevel::resolve(quality), progress)
    }

    /// Separate `buffer` and return the result with its sample rate.
    ///
    /// Mono input is duplicated to stereo and wider input keeps its first
    /// two channels. The final progress report is exactly `1.0`.
    pub fn process(
        &self,
        buffer: &AudioBuffer,
        method: &SeparationMethod,
        quality: QualityLevel,
        progress: &mut dyn ProgressSink,
    ) -> SeparationResult<(AudioBuffer, u32)> {
        let start = Instant::now();
        let mut progress = MonotonicProgress::new(progress);
        progress.report(0.0);

        if buffer.num_channels() == 0 || buffer.is_empty() {
            return Err(SeparationError::EmptyBuffer);
        }

        let backend = self
            .backends
            .iter()
            .find(|b| b.supports(method))
            .ok_or_else(|| {
                SeparationError::BackendUnavailable(format!("no backend registered for '{}'", method))
            })?;

        let stereo = buffer.to_stereo();
        let params = quality.params();
        progress.report(CONDITIONING_END);

        log::info!(
            "Separating {:.2}s ({} ch, {} Hz) with '{}' at {} quality on '{}'",
            buffer.duration(),
            buffer.num_channels(),
            buffer.sample_rate(),
            method,
            quality,
            backend.name()
        );

        let output = {
            let mut stage = ScaledProgress::new(&mut progress, CONDITIONING_END, METHOD_END);
            backend.separate(&stereo, &params, method, &mut stage)?
        };
        progress.report(METHOD_END);

        if output.is_empty() {
            return Err(SeparationError::InvalidOutputShape {
                expected: format!("{} frames", buffer.frames()),
                got: "empty buffer".into(),
            });
        }
        let sample_rate = output.sample_rate();

        log::info!(
            "Separation finished in {} ms ({} frames out)",
            start.elapsed().as_millis(),
            output.frames()
        );
        progress.report(1.0);
        Ok((output, sample_rate))
    }
}
