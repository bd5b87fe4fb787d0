//! Stem model contract
//!
//! A stem model is a black box: a batch of one multichannel waveform goes
//! in, a fixed ordered set of stems comes out.

use std::path::Path;

use ndarray::{Array3, Array4};

use super::stems::StemType;
use crate::error::{SeparationError, SeparationResult};
use crate::inference::{InferenceConfig, InferenceEngine};

/// Waveform-to-stems model
pub trait StemModel: Send + Sync {
    /// Stems in output order
    fn stems(&self) -> &[StemType];

    /// Rate the model expects and produces
    fn sample_rate(&self) -> u32;

    /// `[1, channels, samples]` -> `[1, stems, channels, samples]`
    fn separate(&self, input: &Array3<f32>) -> SeparationResult<Array4<f32>>;
}

/// [`StemModel`] backed by an ONNX graph run through tract
pub struct OnnxStemModel {
    engine: InferenceEngine,
    stems: Vec<StemType>,
    sample_rate: u32,
}

impl OnnxStemModel {
    pub fn load<P: AsRef<Path>>(model_path: P, config: &InferenceConfig) -> SeparationResult<Self> {
        let engine = InferenceEngine::new(model_path, config)?;
        let stems = if config.six_stems {
            StemType::extended_6()
        } else {
            StemType::standard_4()
        };
        Ok(Self {
            engine,
            stems,
            sample_rate: config.sample_rate,
        })
    }
}

impl StemModel for OnnxStemModel {
    fn stems(&self) -> &[StemType] {
        &self.stems
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn separate(&self, input: &Array3<f32>) -> SeparationResult<Array4<f32>> {
        let (batch, channels, samples) = input.dim();
        if batch != 1 {
            return Err(SeparationError::InvalidInputShape {
                expected: "[1, channels, samples]".into(),
                got: format!("{:?}", input.shape()),
            });
        }

        let output = self.engine.run_array3(input)?;
        let expected = (1, self.stems.len(), channels, samples);
        if output.dim() != expected {
            return Err(SeparationError::InvalidOutputShape {
                expected: format!("{:?}", expected),
                got: format!("{:?}", output.shape()),
            });
        }
        Ok(output)
    }
}
