//! Aligned program/commentary track pair
//!
//! The placement engine grows its buffers in both directions: a comment
//! anchored before the start of the recording prepends silence, one running
//! past the end appends it. The recording and the accumulating commentary
//! track must stay index-aligned through all of that, so both live behind a
//! single abstraction that pads them together and tracks the cumulative
//! left padding.

use crate::error::{MixError, Result};
use talkover_core::AudioBuffer;

/// The recording plus the commentary accumulator, always identical in
/// shape.
///
/// `left_pad` is the number of frames prepended since construction; a
/// nominal frame index computed from a timestamp maps to the actual buffer
/// index `nominal + left_pad`.
#[derive(Debug, Clone)]
pub struct AlignedTracks {
    program: AudioBuffer,
    commentary: AudioBuffer,
    left_pad: usize,
}

impl AlignedTracks {
    /// Wrap a recording, starting with a silent commentary track of the
    /// same shape.
    pub fn new(program: AudioBuffer) -> Self {
        let commentary = AudioBuffer::silence(
            program.num_channels(),
            program.num_frames(),
            program.sample_rate(),
        )
        .expect("program buffer shape is already validated");
        Self {
            program,
            commentary,
            left_pad: 0,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.program.num_frames()
    }

    pub fn num_channels(&self) -> usize {
        self.program.num_channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.program.sample_rate()
    }

    /// Frames prepended so far.
    pub fn left_pad(&self) -> usize {
        self.left_pad
    }

    pub fn program(&self) -> &AudioBuffer {
        &self.program
    }

    pub fn commentary(&self) -> &AudioBuffer {
        &self.commentary
    }

    /// Prepend `frames` zeros to both buffers and advance the pad offset.
    pub fn prepend_zeros(&mut self, frames: usize) {
        pad_front(&mut self.program, frames);
        pad_front(&mut self.commentary, frames);
        self.left_pad += frames;
    }

    /// Append `frames` zeros to both buffers.
    pub fn append_zeros(&mut self, frames: usize) {
        pad_back(&mut self.program, frames);
        pad_back(&mut self.commentary, frames);
    }

    /// Copy a window of the recording (commentary excluded).
    pub fn program_window(&self, start: usize, end: usize) -> AudioBuffer {
        self.program.window(start, end)
    }

    /// Sum a clip into the commentary track at `start`. Overlapping clips
    /// accumulate; nothing is overwritten.
    pub fn add_clip(&mut self, clip: &AudioBuffer, start: usize) -> Result<()> {
        if clip.num_channels() != self.num_channels() {
            return Err(MixError::ChannelMismatch {
                clip: clip.num_channels(),
                track: self.num_channels(),
            });
        }
        if clip.sample_rate() != self.sample_rate() {
            return Err(MixError::SampleRateMismatch {
                clip: clip.sample_rate(),
                track: self.sample_rate(),
            });
        }
        debug_assert!(start + clip.num_frames() <= self.num_frames());

        for ch in 0..clip.num_channels() {
            let dst = &mut self.commentary.channel_mut(ch)[start..start + clip.num_frames()];
            for (out, &sample) in dst.iter_mut().zip(clip.channel(ch)) {
                *out += sample;
            }
        }
        Ok(())
    }

    /// Element-wise sum of recording and commentary. The sum is not
    /// clamped; loud or overlapping comments can exceed full scale.
    pub fn mixdown(&self) -> AudioBuffer {
        let channels = self
            .program
            .channels()
            .iter()
            .zip(self.commentary.channels())
            .map(|(p, c)| p.iter().zip(c).map(|(&a, &b)| a + b).collect())
            .collect();
        AudioBuffer::new(channels, self.sample_rate())
            .expect("summed buffer keeps the validated shape")
    }

}

fn pad_front(buffer: &mut AudioBuffer, frames: usize) {
    for ch in 0..buffer.num_channels() {
        let channel = buffer.channel_mut(ch);
        let mut padded = vec![0.0; frames + channel.len()];
        padded[frames..].copy_from_slice(channel);
        *channel = padded;
    }
}

fn pad_back(buffer: &mut AudioBuffer, frames: usize) {
    for ch in 0..buffer.num_channels() {
        let channel = buffer.channel_mut(ch);
        let new_len = channel.len() + frames;
        channel.resize(new_len, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks() -> AlignedTracks {
        AlignedTracks::new(AudioBuffer::mono(vec![0.5; 100], 8000).unwrap())
    }

    #[test]
    fn padding_keeps_buffers_aligned() {
        let mut t = tracks();
        t.prepend_zeros(10);
        t.append_zeros(5);

        assert_eq!(t.num_frames(), 115);
        assert_eq!(t.program().num_frames(), t.commentary().num_frames());
        assert_eq!(t.left_pad(), 10);

        // Original content sits at nominal index + left_pad
        assert_eq!(t.program().channel(0)[9], 0.0);
        assert_eq!(t.program().channel(0)[10], 0.5);
    }

    #[test]
    fn left_pad_accumulates() {
        let mut t = tracks();
        t.prepend_zeros(4);
        t.prepend_zeros(6);
        assert_eq!(t.left_pad(), 10);
    }

    #[test]
    fn clips_accumulate() {
        let mut t = tracks();
        let clip = AudioBuffer::mono(vec![0.25; 10], 8000).unwrap();
        t.add_clip(&clip, 20).unwrap();
        t.add_clip(&clip, 25).unwrap();

        let c = t.commentary().channel(0);
        assert_eq!(c[19], 0.0);
        assert_eq!(c[20], 0.25);
        assert_eq!(c[25], 0.5); // overlap sums
        assert_eq!(c[34], 0.25);
        assert_eq!(c[35], 0.0);
    }

    #[test]
    fn add_clip_rejects_mismatched_layout() {
        let mut t = tracks();
        let stereo = AudioBuffer::silence(2, 10, 8000).unwrap();
        assert!(matches!(
            t.add_clip(&stereo, 0),
            Err(MixError::ChannelMismatch { clip: 2, track: 1 })
        ));

        let wrong_rate = AudioBuffer::mono(vec![0.0; 10], 44100).unwrap();
        assert!(matches!(
            t.add_clip(&wrong_rate, 0),
            Err(MixError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn mixdown_sums_elementwise() {
        let mut t = tracks();
        let clip = AudioBuffer::mono(vec![0.75; 100], 8000).unwrap();
        t.add_clip(&clip, 0).unwrap();

        let mix = t.mixdown();
        assert!(mix.channel(0).iter().all(|&s| (s - 1.25).abs() < 1e-7));
    }
}
