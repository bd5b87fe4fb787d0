//! Neural stem backend
//!
//! The model is loaded on first use and kept in a once-only cell shared by
//! every clone of the backend. Concurrent first callers block on a single
//! load; a failed load stores nothing, so the next call tries again.

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::Array3;
use once_cell::sync::OnceCell;
use unmix_core::AudioBuffer;
use unmix_dsp::{NormalizeConfig, normalize_with};

use super::SeparationBackend;
use super::model::{OnnxStemModel, StemModel};
use super::stems::StemCollection;
use crate::engine::SeparationMethod;
use crate::error::{SeparationError, SeparationResult};
use crate::inference::InferenceConfig;
use crate::progress::ProgressSink;
use crate::quality::ProcessingParameters;

type ModelLoader = dyn Fn() -> SeparationResult<Box<dyn StemModel>> + Send + Sync;

/// Backend for `neural:<stem>` methods
#[derive(Clone)]
pub struct NeuralBackend {
    loader: Arc<ModelLoader>,
    model: Arc<OnceCell<Box<dyn StemModel>>>,
    normalize: NormalizeConfig,
}

impl NeuralBackend {
    /// Backend whose model is produced by `loader` on first use
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> SeparationResult<Box<dyn StemModel>> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            model: Arc::new(OnceCell::new()),
            normalize: NormalizeConfig::default(),
        }
    }

    /// Backend for an ONNX stem model on disk
    pub fn onnx(model_path: impl Into<PathBuf>, config: InferenceConfig) -> Self {
        let path = model_path.into();
        Self::new(move || {
            OnnxStemModel::load(&path, &config).map(|m| Box::new(m) as Box<dyn StemModel>)
        })
    }

    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn model(&self) -> SeparationResult<&dyn StemModel> {
        self.model
            .get_or_try_init(|| {
                log::info!("Initializing neural stem model");
                (self.loader)()
            })
            .map(|m| &**m)
            .map_err(|e| match e {
                SeparationError::BackendUnavailable(reason) => {
                    SeparationError::BackendUnavailable(reason)
                }
                other => SeparationError::BackendUnavailable(other.to_string()),
            })
    }
}

impl SeparationBackend for NeuralBackend {
    fn name(&self) -> &str {
        "neural"
    }

    fn supports(&self, method: &SeparationMethod) -> bool {
        matches!(method, SeparationMethod::Neural(_))
    }

    fn separate(
        &self,
        stereo: &AudioBuffer,
        _params: &ProcessingParameters,
        method: &SeparationMethod,
        progress: &mut dyn ProgressSink,
    ) -> SeparationResult<AudioBuffer> {
        let SeparationMethod::Neural(target) = method else {
            return Err(SeparationError::BackendUnavailable(format!(
                "'{}' is not a neural method",
                method
            )));
        };
        progress.report(0.0);

        let model = self.model()?;
        progress.report(0.1);

        let sample_rate = model.sample_rate();
        if stereo.sample_rate() != sample_rate {
            return Err(SeparationError::SampleRateMismatch {
                expected: sample_rate,
                got: stereo.sample_rate(),
            });
        }

        let channels = stereo.num_channels();
        let frames = stereo.frames();
        let data: Vec<f32> = stereo
            .channels()
            .iter()
            .flat_map(|ch| ch.iter().map(|&s| s as f32))
            .collect();
        let input = Array3::from_shape_vec((1, channels, frames), data).map_err(|e| {
            SeparationError::InvalidInputShape {
                expected: format!("[1, {}, {}]", channels, frames),
                got: e.to_string(),
            }
        })?;

        let output = model.separate(&input)?;
        progress.report(0.8);

        let stems = StemCollection::from_model_output(&output, model.stems(), sample_rate)?;
        let selected = stems.target(*target).ok_or_else(|| {
            SeparationError::InvalidMethod(format!("model does not produce '{}'", target))
        })?;
        log::debug!("neural: selected '{}' from {} stems", target, stems.len());

        let out = normalize_with(&selected.mono_mix(), &self.normalize);
        progress.report(1.0);
        Ok(AudioBuffer::from_mono(out, sample_rate)?)
    }
}
