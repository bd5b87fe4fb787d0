//! ONNX inference through tract (pure Rust, CPU)

use std::path::{Path, PathBuf};

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use crate::error::{SeparationError, SeparationResult};

/// Configuration for the inference engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Run tract's graph optimizer before building the plan
    pub optimize_graph: bool,
    /// Rate the model was trained at
    pub sample_rate: u32,
    /// Six-stem model (adds guitar and piano)
    pub six_stems: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            optimize_graph: true,
            sample_rate: 44100,
            six_stems: false,
        }
    }
}

type TractPlan = tract_onnx::prelude::SimplePlan<
    tract_onnx::prelude::TypedFact,
    Box<dyn tract_onnx::prelude::TypedOp>,
    tract_onnx::prelude::Graph<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
    >,
>;

/// Loaded, runnable ONNX model
pub struct InferenceEngine {
    plan: TractPlan,
    path: PathBuf,
}

impl InferenceEngine {
    /// Load and prepare a model
    pub fn new<P: AsRef<Path>>(model_path: P, config: &InferenceConfig) -> SeparationResult<Self> {
        use tract_onnx::prelude::*;

        let path = model_path.as_ref();
        if !path.exists() {
            return Err(SeparationError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let load_failed = |e: TractError| {
            SeparationError::BackendUnavailable(format!("{}: {}", path.display(), e))
        };

        let model = tract_onnx::onnx().model_for_path(path).map_err(load_failed)?;
        let typed = if config.optimize_graph {
            model.into_optimized().map_err(load_failed)?
        } else {
            model.into_typed().map_err(load_failed)?
        };
        let plan = typed.into_runnable().map_err(load_failed)?;

        log::info!(
            "Loaded model {} (optimized: {})",
            path.display(),
            config.optimize_graph
        );

        Ok(Self {
            plan,
            path: path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.path
    }

    /// Run a `[batch, channels, samples]` input through a model producing
    /// `[batch, stems, channels, samples]`
    pub fn run_array3(&self, input: &Array3<f32>) -> SeparationResult<Array4<f32>> {
        use tract_onnx::prelude::*;

        let failed = |e: TractError| SeparationError::InferenceFailed {
            reason: e.to_string(),
        };

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(input.shape(), &data).map_err(failed)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(failed)?;

        let first = outputs.first().ok_or_else(|| SeparationError::InferenceFailed {
            reason: "model produced no outputs".into(),
        })?;
        let view = first.to_array_view::<f32>().map_err(failed)?;

        let shape = view.shape().to_vec();
        let [b, s, c, n] = shape[..] else {
            return Err(SeparationError::InvalidOutputShape {
                expected: "[batch, stems, channels, samples]".into(),
                got: format!("{:?}", shape),
            });
        };
        let values: Vec<f32> = view.iter().copied().collect();
        Array4::from_shape_vec((b, s, c, n), values).map_err(|e| {
            SeparationError::InvalidOutputShape {
                expected: format!("{:?}", shape),
                got: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model() {
        let result = InferenceEngine::new("/nonexistent/model.onnx", &InferenceConfig::default());
        assert!(matches!(result, Err(SeparationError::ModelNotFound { .. })));
    }

    #[test]
    fn test_garbage_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let result = InferenceEngine::new(&path, &InferenceConfig::default());
        assert!(matches!(result, Err(SeparationError::BackendUnavailable(_))));
    }
}
