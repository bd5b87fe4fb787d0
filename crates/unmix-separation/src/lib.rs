//! unmix-separation: Stereo music separation engine
//!
//! ## Methods
//!
//! - **Vocal removal**: center subtraction blended with an inter-channel
//!   similarity mask, followed by zero-phase bandstops over vocal bands
//! - **Instrumental isolation**: widened mid/side mix through HPSS,
//!   recombined with harmonic emphasis
//! - **Harmonic/percussive**: median-filter HPSS of the mono mixdown
//! - **Neural stems**: any ONNX model mapping `[1, ch, n]` to
//!   `[1, stems, ch, n]`, loaded lazily and shared across clones
//!
//! [`analysis`] adds frame features, a vocal-presence score and a chroma
//! fingerprint for inspecting inputs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unmix_separation::{SeparationEngine, SeparationMethod, QualityLevel};
//!
//! let engine = SeparationEngine::new();
//! let (output, sample_rate) = engine.process(
//!     &buffer,
//!     &SeparationMethod::VocalRemoval,
//!     QualityLevel::High,
//!     &mut |p: f64| println!("{:.0}%", p * 100.0),
//! )?;
//! ```

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod inference;
pub mod methods;
pub mod progress;
pub mod quality;
pub mod separation;

pub use analysis::{
    AudioProperties, audio_fingerprint, detect_audio_properties, estimate_vocal_presence,
};
pub use config::{EngineConfig, HpssConfig, InstrumentalConfig, VocalRemovalConfig};
pub use engine::{SeparationEngine, SeparationMethod};
pub use error::{SeparationError, SeparationResult};
pub use inference::{InferenceConfig, InferenceEngine};
pub use progress::{MonotonicProgress, NoProgress, ProgressSink, ScaledProgress};
pub use quality::{ProcessingParameters, QualityLevel};
pub use separation::{
    DspBackend, NeuralBackend, OnnxStemModel, SeparationBackend, StemCollection, StemModel,
    StemTarget, StemType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
