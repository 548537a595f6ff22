//! Planar audio buffer
//!
//! Audio moves through Talkover as planar (non-interleaved) `f32` samples
//! tagged with a sample rate. Buffers are value-like: components clone them
//! instead of sharing them, because filtering and gain stages mutate in
//! place. Channel ordering follows BS.1770: Left, Right, Center, Left
//! surround, Right surround.

use crate::error::{CoreError, Result};

/// Maximum channel count supported by the L/R/C/Ls/Rs layout
pub const MAX_CHANNELS: usize = 5;

/// Planar multichannel audio with a sample rate.
///
/// Invariants, enforced at construction: 1 to [`MAX_CHANNELS`] channels, all
/// channels the same length, non-zero sample rate. Samples are expected to be
/// finite; construction does not scan for NaN/infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from planar channel data.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::ZeroSampleRate);
        }
        if channels.is_empty() {
            return Err(CoreError::NoChannels);
        }
        if channels.len() > MAX_CHANNELS {
            return Err(CoreError::TooManyChannels(channels.len()));
        }
        let expected = channels[0].len();
        for (i, ch) in channels.iter().enumerate().skip(1) {
            if ch.len() != expected {
                return Err(CoreError::ChannelLengthMismatch {
                    channel: i,
                    expected,
                    actual: ch.len(),
                });
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a mono buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a silent buffer with the given shape.
    pub fn silence(num_channels: usize, num_frames: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0; num_frames]; num_channels], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut Vec<f32> {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Copy a frame window `[start, end)` out of every channel.
    ///
    /// Bounds are clamped to the buffer length, so an overshooting window
    /// yields a shorter buffer rather than a panic.
    pub fn window(&self, start: usize, end: usize) -> Self {
        let len = self.num_frames();
        let start = start.min(len);
        let end = end.clamp(start, len);
        Self {
            channels: self
                .channels
                .iter()
                .map(|ch| ch[start..end].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Multiply every sample by a linear gain factor.
    pub fn scale(&mut self, gain: f32) {
        for ch in &mut self.channels {
            for sample in ch.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_shapes() {
        assert!(matches!(
            AudioBuffer::new(vec![], 44100),
            Err(CoreError::NoChannels)
        ));
        assert!(matches!(
            AudioBuffer::new(vec![vec![0.0]; 6], 44100),
            Err(CoreError::TooManyChannels(6))
        ));
        assert!(matches!(
            AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100),
            Err(CoreError::ChannelLengthMismatch { channel: 1, .. })
        ));
        assert!(matches!(
            AudioBuffer::mono(vec![0.0], 0),
            Err(CoreError::ZeroSampleRate)
        ));
    }

    #[test]
    fn shape_accessors() {
        let buf = AudioBuffer::silence(2, 441, 44100).unwrap();
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_frames(), 441);
        assert!((buf.duration_secs() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn window_clamps_bounds() {
        let buf = AudioBuffer::mono(vec![1.0, 2.0, 3.0, 4.0], 8000).unwrap();
        let w = buf.window(1, 3);
        assert_eq!(w.channel(0), &[2.0, 3.0]);

        let clamped = buf.window(2, 10);
        assert_eq!(clamped.channel(0), &[3.0, 4.0]);

        let empty = buf.window(9, 10);
        assert!(empty.is_empty());
    }

    #[test]
    fn scale_and_peak() {
        let mut buf = AudioBuffer::mono(vec![0.5, -0.25], 8000).unwrap();
        buf.scale(2.0);
        assert_eq!(buf.channel(0), &[1.0, -0.5]);
        assert_eq!(buf.peak(), 1.0);
    }
}
