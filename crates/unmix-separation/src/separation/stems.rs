//! Stem types and collections

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array4, Axis};
use serde::{Deserialize, Serialize};
use unmix_core::AudioBuffer;

use crate::error::{SeparationError, SeparationResult};

/// Available stem types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemType {
    /// Drum kit (kick, snare, hats, toms, cymbals)
    Drums,
    /// Bass instruments (bass guitar, synth bass)
    Bass,
    /// Vocal content (lead, backing, harmonies)
    Vocals,
    /// Everything else (guitars, synths, strings, etc.)
    Other,
    /// Piano and keyboard instruments (6-stem models only)
    Piano,
    /// Guitar (6-stem models only)
    Guitar,
}

impl StemType {
    pub fn display_name(&self) -> &'static str {
        match self {
            StemType::Drums => "Drums",
            StemType::Bass => "Bass",
            StemType::Vocals => "Vocals",
            StemType::Other => "Other",
            StemType::Piano => "Piano",
            StemType::Guitar => "Guitar",
        }
    }

    /// Lowercase name used in selectors and file names
    pub fn short_name(&self) -> &'static str {
        match self {
            StemType::Drums => "drums",
            StemType::Bass => "bass",
            StemType::Vocals => "vocals",
            StemType::Other => "other",
            StemType::Piano => "piano",
            StemType::Guitar => "guitar",
        }
    }

    /// Output order of 4-stem models
    pub fn standard_4() -> Vec<StemType> {
        vec![
            StemType::Drums,
            StemType::Bass,
            StemType::Other,
            StemType::Vocals,
        ]
    }

    /// Output order of 6-stem models
    pub fn extended_6() -> Vec<StemType> {
        vec![
            StemType::Drums,
            StemType::Bass,
            StemType::Other,
            StemType::Vocals,
            StemType::Guitar,
            StemType::Piano,
        ]
    }
}

impl fmt::Display for StemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for StemType {
    type Err = SeparationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drums" => Ok(StemType::Drums),
            "bass" => Ok(StemType::Bass),
            "vocals" => Ok(StemType::Vocals),
            "other" => Ok(StemType::Other),
            "piano" => Ok(StemType::Piano),
            "guitar" => Ok(StemType::Guitar),
            _ => Err(SeparationError::InvalidMethod(format!("unknown stem '{}'", s))),
        }
    }
}

/// What a neural separation should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StemTarget {
    /// One model stem
    Stem(StemType),
    /// Sum of every non-vocal stem
    Instrumental,
}

impl fmt::Display for StemTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StemTarget::Stem(stem) => write!(f, "{}", stem),
            StemTarget::Instrumental => f.write_str("instrumental"),
        }
    }
}

impl FromStr for StemTarget {
    type Err = SeparationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instrumental" => Ok(StemTarget::Instrumental),
            other => other.parse().map(StemTarget::Stem),
        }
    }
}

/// Separated stems sharing one sample rate and length
#[derive(Debug, Clone)]
pub struct StemCollection {
    stems: HashMap<StemType, AudioBuffer>,
    /// Stem order as produced by the model
    order: Vec<StemType>,
    pub sample_rate: u32,
}

impl StemCollection {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            stems: HashMap::new(),
            order: Vec::new(),
            sample_rate,
        }
    }

    /// Split a `[1, stems, channels, samples]` model output
    pub fn from_model_output(
        output: &Array4<f32>,
        stem_types: &[StemType],
        sample_rate: u32,
    ) -> SeparationResult<Self> {
        let (batch, stems, _channels, _samples) = output.dim();
        if batch != 1 || stems != stem_types.len() {
            return Err(SeparationError::InvalidOutputShape {
                expected: format!("[1, {}, channels, samples]", stem_types.len()),
                got: format!("{:?}", output.shape()),
            });
        }

        let mut collection = Self::new(sample_rate);
        let first = output.index_axis(Axis(0), 0);
        for (stem_type, stem) in stem_types.iter().zip(first.outer_iter()) {
            let channels: Vec<Vec<f64>> = stem
                .outer_iter()
                .map(|ch| ch.iter().map(|&s| s as f64).collect())
                .collect();
            collection.add(*stem_type, AudioBuffer::new(channels, sample_rate)?);
        }
        Ok(collection)
    }

    pub fn add(&mut self, stem_type: StemType, audio: AudioBuffer) {
        if self.stems.insert(stem_type, audio).is_none() {
            self.order.push(stem_type);
        }
    }

    pub fn get(&self, stem_type: StemType) -> Option<&AudioBuffer> {
        self.stems.get(&stem_type)
    }

    /// Stem types in insertion order
    pub fn stem_types(&self) -> &[StemType] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Sum of stems with per-stem gains (missing gains are 1.0)
    pub fn remix(&self, gains: &HashMap<StemType, f64>) -> Option<AudioBuffer> {
        let reference = self.order.first().and_then(|t| self.stems.get(t))?;
        let mut channels = vec![vec![0.0; reference.frames()]; reference.num_channels()];

        for stem_type in &self.order {
            let gain = gains.get(stem_type).copied().unwrap_or(1.0);
            if gain == 0.0 {
                continue;
            }
            let Some(stem) = self.stems.get(stem_type) else {
                continue;
            };
            for (dst, src) in channels.iter_mut().zip(stem.channels()) {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += s * gain;
                }
            }
        }

        AudioBuffer::new(channels, self.sample_rate).ok()
    }

    /// Everything except vocals
    pub fn instrumental(&self) -> Option<AudioBuffer> {
        self.solo_or_mute(StemType::Vocals, false)
    }

    /// Vocals only
    pub fn acapella(&self) -> Option<AudioBuffer> {
        self.solo_or_mute(StemType::Vocals, true)
    }

    /// Requested target
    pub fn target(&self, target: StemTarget) -> Option<AudioBuffer> {
        match target {
            StemTarget::Stem(stem) => self.get(stem).cloned(),
            StemTarget::Instrumental => self.instrumental(),
        }
    }

    fn solo_or_mute(&self, stem: StemType, solo: bool) -> Option<AudioBuffer> {
        let gains: HashMap<StemType, f64> = self
            .order
            .iter()
            .map(|&t| (t, if (t == stem) == solo { 1.0 } else { 0.0 }))
            .collect();
        self.remix(&gains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn collection() -> StemCollection {
        let mut c = StemCollection::new(44100);
        c.add(StemType::Vocals, AudioBuffer::from_mono(vec![1.0; 100], 44100).unwrap());
        c.add(StemType::Drums, AudioBuffer::from_mono(vec![0.5; 100], 44100).unwrap());
        c.add(StemType::Bass, AudioBuffer::from_mono(vec![0.25; 100], 44100).unwrap());
        c
    }

    #[test]
    fn test_stem_sets() {
        assert_eq!(StemType::standard_4().len(), 4);
        assert_eq!(StemType::extended_6().len(), 6);
    }

    #[test]
    fn test_remix() {
        let c = collection();
        let mut gains = HashMap::new();
        gains.insert(StemType::Vocals, 0.5);
        gains.insert(StemType::Drums, 1.0);
        gains.insert(StemType::Bass, 0.0);

        let remixed = c.remix(&gains).unwrap();
        assert_eq!(remixed.frames(), 100);
        // 1.0*0.5 + 0.5*1.0
        assert!((remixed.channel(0).unwrap()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_instrumental_and_acapella() {
        let c = collection();
        assert_eq!(c.instrumental().unwrap().channel(0).unwrap()[0], 0.75);
        assert_eq!(c.acapella().unwrap().channel(0).unwrap()[0], 1.0);
        assert_eq!(
            c.target(StemTarget::Stem(StemType::Drums)).unwrap().channel(0).unwrap()[0],
            0.5
        );
        assert!(c.target(StemTarget::Stem(StemType::Piano)).is_none());
    }

    #[test]
    fn test_from_model_output() {
        let mut output = Array4::<f32>::zeros((1, 4, 2, 8));
        output[[0, 3, 1, 5]] = 0.5;
        let c = StemCollection::from_model_output(&output, &StemType::standard_4(), 44100).unwrap();

        let vocals = c.get(StemType::Vocals).unwrap();
        assert_eq!(vocals.num_channels(), 2);
        assert_eq!(vocals.channel(1).unwrap()[5], 0.5);
        assert_eq!(c.stem_types(), StemType::standard_4().as_slice());

        let wrong = Array4::<f32>::zeros((1, 3, 2, 8));
        assert!(matches!(
            StemCollection::from_model_output(&wrong, &StemType::standard_4(), 44100),
            Err(SeparationError::InvalidOutputShape { .. })
        ));
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!("instrumental".parse::<StemTarget>().unwrap(), StemTarget::Instrumental);
        assert_eq!(
            "vocals".parse::<StemTarget>().unwrap(),
            StemTarget::Stem(StemType::Vocals)
        );
        assert!("kazoo".parse::<StemTarget>().is_err());
    }
}
