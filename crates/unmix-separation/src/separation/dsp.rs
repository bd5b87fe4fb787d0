//! Classical DSP backend

use unmix_core::AudioBuffer;

use super::SeparationBackend;
use crate::config::EngineConfig;
use crate::engine::SeparationMethod;
use crate::error::{SeparationError, SeparationResult};
use crate::methods::{isolate_instrumental, remove_vocals, separate_harmonic};
use crate::progress::ProgressSink;
use crate::quality::ProcessingParameters;

/// Runs vocal removal, instrumental isolation and harmonic extraction
#[derive(Debug, Clone, Default)]
pub struct DspBackend {
    config: EngineConfig,
}

impl DspBackend {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl SeparationBackend for DspBackend {
    fn name(&self) -> &str {
        "dsp"
    }

    fn supports(&self, method: &SeparationMethod) -> bool {
        !matches!(method, SeparationMethod::Neural(_))
    }

    fn separate(
        &self,
        stereo: &AudioBuffer,
        params: &ProcessingParameters,
        method: &SeparationMethod,
        progress: &mut dyn ProgressSink,
    ) -> SeparationResult<AudioBuffer> {
        let (Some(left), Some(right)) = (stereo.channel(0), stereo.channel(1)) else {
            return Err(SeparationError::InvalidInputShape {
                expected: "2 channels".into(),
                got: format!("{} channels", stereo.num_channels()),
            });
        };
        let sample_rate = stereo.sample_rate();
        let norm = &self.config.normalize;

        // only vocal removal follows the quality tier; HPSS methods carry their own geometry
        log::debug!(
            "dsp: {} on {} frames (tier fft {}, hop {})",
            method,
            stereo.frames(),
            params.fft_size,
            params.hop_size
        );

        let out = match method {
            SeparationMethod::VocalRemoval => remove_vocals(
                left,
                right,
                sample_rate,
                params,
                &self.config.vocal_removal,
                norm,
                progress,
            )?,
            SeparationMethod::InstrumentalIsolation => isolate_instrumental(
                left,
                right,
                &self.config.instrumental,
                norm,
                progress,
            )?,
            SeparationMethod::HarmonicPercussive => separate_harmonic(
                &[left, right],
                &self.config.harmonic_percussive,
                norm,
                progress,
            )?,
            SeparationMethod::Neural(_) => {
                return Err(SeparationError::BackendUnavailable(format!(
                    "'{}' is not a DSP method",
                    method
                )));
            }
        };

        Ok(AudioBuffer::from_mono(out, sample_rate)?)
    }
}
