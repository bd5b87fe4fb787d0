//! Planar audio buffer
//!
//! Every separation stage takes an [`AudioBuffer`] by reference and returns
//! a new one. Channels are stored planar (one `Vec` per channel) so the
//! spectral code can borrow a single channel as a contiguous slice.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::sample::{self, Sample};

/// Multi-channel audio with a shared sample rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioBuffer {
    channels: Vec<Vec<Sample>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build from planar channel data.
    ///
    /// All channels must have the same length and the sample rate must be
    /// positive. Zero channels is allowed (an empty buffer).
    pub fn new(channels: Vec<Vec<Sample>>, sample_rate: u32) -> CoreResult<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate(sample_rate));
        }
        if let Some(first) = channels.first() {
            let expected = first.len();
            for (channel, data) in channels.iter().enumerate() {
                if data.len() != expected {
                    return Err(CoreError::ChannelLengthMismatch {
                        channel,
                        expected,
                        got: data.len(),
                    });
                }
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel buffer
    pub fn from_mono(samples: Vec<Sample>, sample_rate: u32) -> CoreResult<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Two-channel buffer
    pub fn from_stereo(
        left: Vec<Sample>,
        right: Vec<Sample>,
        sample_rate: u32,
    ) -> CoreResult<Self> {
        Self::new(vec![left, right], sample_rate)
    }

    /// Zero-filled buffer
    pub fn silence(num_channels: usize, frames: usize, sample_rate: u32) -> CoreResult<Self> {
        Self::new(vec![vec![0.0; frames]; num_channels], sample_rate)
    }

    /// De-interleave `[L R L R ...]` style data
    pub fn from_interleaved(
        samples: &[Sample],
        num_channels: usize,
        sample_rate: u32,
    ) -> CoreResult<Self> {
        if num_channels == 0 {
            return Err(CoreError::NoChannels);
        }
        if samples.len() % num_channels != 0 {
            return Err(CoreError::InterleaveMismatch {
                len: samples.len(),
                channels: num_channels,
            });
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Interleave channels into a single vector
    pub fn to_interleaved(&self) -> Vec<Sample> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    #[inline]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// True when there are no channels or no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Borrow one channel
    pub fn channel(&self, index: usize) -> Option<&[Sample]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    /// Average of all channels
    pub fn mono_mix(&self) -> Vec<Sample> {
        let n = self.channels.len();
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return self.channels[0].clone();
        }
        let scale = 1.0 / n as f64;
        (0..self.frames())
            .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f64>() * scale)
            .collect()
    }

    /// Downmix to a single channel (channel average)
    pub fn to_mono(&self) -> Self {
        Self {
            channels: vec![self.mono_mix()],
            sample_rate: self.sample_rate,
        }
    }

    /// Mono is duplicated, stereo is cloned, wider layouts keep the first two
    /// channels.
    pub fn to_stereo(&self) -> Self {
        let channels = match self.channels.len() {
            0 => vec![Vec::new(), Vec::new()],
            1 => vec![self.channels[0].clone(), self.channels[0].clone()],
            2 => self.channels.clone(),
            n => {
                log::debug!("Dropping {} channels beyond stereo", n - 2);
                self.channels[..2].to_vec()
            }
        };
        Self {
            channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Multiply every sample by a linear gain
    pub fn apply_gain(&self, gain: f64) -> Self {
        Self {
            channels: self
                .channels
                .iter()
                .map(|ch| sample::scaled(ch, gain))
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Peak absolute value across all channels
    pub fn peak(&self) -> Sample {
        self.channels
            .iter()
            .map(|ch| sample::peak(ch))
            .fold(0.0, f64::max)
    }

    /// RMS across all channels
    pub fn rms(&self) -> Sample {
        let total = self.channels.len() * self.frames();
        if total == 0 {
            return 0.0;
        }
        let energy: f64 = self.channels.iter().map(|ch| sample::energy(ch)).sum();
        (energy / total as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_ragged_channels() {
        let err = AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).unwrap_err();
        assert_eq!(
            err,
            CoreError::ChannelLengthMismatch {
                channel: 1,
                expected: 4,
                got: 3
            }
        );
        assert!(AudioBuffer::new(vec![vec![0.0]], 0).is_err());
    }

    #[test]
    fn test_interleave_round_trip() {
        let interleaved = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2, 48000).unwrap();

        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.channel(0).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[-1.0, -2.0, -3.0]);
        assert_eq!(buffer.to_interleaved(), interleaved);

        assert!(AudioBuffer::from_interleaved(&[0.0; 5], 2, 48000).is_err());
    }

    #[test]
    fn test_channel_conversion() {
        let stereo = AudioBuffer::from_stereo(vec![1.0, 0.0], vec![0.0, 1.0], 44100).unwrap();
        let mono = stereo.to_mono();
        assert_eq!(mono.num_channels(), 1);
        assert_eq!(mono.channel(0).unwrap(), &[0.5, 0.5]);

        let up = mono.to_stereo();
        assert_eq!(up.num_channels(), 2);
        assert_eq!(up.channel(0), up.channel(1));

        let wide = AudioBuffer::new(vec![vec![1.0], vec![2.0], vec![3.0]], 44100).unwrap();
        let down = wide.to_stereo();
        assert_eq!(down.channels(), &[vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_levels_and_gain() {
        let buffer = AudioBuffer::from_stereo(vec![0.5, -0.5], vec![0.25, -0.25], 44100).unwrap();
        assert_relative_eq!(buffer.peak(), 0.5);
        assert_relative_eq!(buffer.apply_gain(2.0).peak(), 1.0);

        let expected_rms = ((0.25 + 0.25 + 0.0625 + 0.0625) / 4.0_f64).sqrt();
        assert_relative_eq!(buffer.rms(), expected_rms, epsilon = 1e-12);
        assert_relative_eq!(buffer.duration(), 2.0 / 44100.0);
    }

    #[test]
    fn test_empty_buffer() {
        let empty = AudioBuffer::new(Vec::new(), 44100).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.rms(), 0.0);
        assert_eq!(empty.mono_mix(), Vec::<f64>::new());

        let no_frames = AudioBuffer::silence(2, 0, 44100).unwrap();
        assert!(no_frames.is_empty());
    }
}
