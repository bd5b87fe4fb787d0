//! Separation backends
//!
//! The engine holds a list of [`SeparationBackend`]s and dispatches each
//! call to the first one that supports the requested method:
//!
//! - [`DspBackend`]: the classical methods, always available
//! - [`NeuralBackend`]: stem models, lazily loaded once and shared

mod dsp;
mod model;
mod neural;
mod stems;

pub use dsp::DspBackend;
pub use model::{OnnxStemModel, StemModel};
pub use neural::NeuralBackend;
pub use stems::{StemCollection, StemTarget, StemType};

use unmix_core::AudioBuffer;

use crate::engine::SeparationMethod;
use crate::error::SeparationResult;
use crate::progress::ProgressSink;
use crate::quality::ProcessingParameters;

/// Common trait for separation backends
pub trait SeparationBackend: Send + Sync {
    /// Backend name for logs and listings
    fn name(&self) -> &str;

    /// Whether [`separate`](Self::separate) accepts `method`
    fn supports(&self, method: &SeparationMethod) -> bool;

    /// Separate a two-channel buffer.
    ///
    /// `progress` is on the backend's own `0..1` scale. The result holds
    /// the separated signal together with its sample rate.
    fn separate(
        &self,
        stereo: &AudioBuffer,
        params: &ProcessingParameters,
        method: &SeparationMethod,
        progress: &mut dyn ProgressSink,
    ) -> SeparationResult<AudioBuffer>;
}
