//! Collaborator contracts
//!
//! Text-to-speech synthesis, time-scale modification and sample-rate
//! conversion are consumed through these traits; the pipeline treats them
//! as opaque synchronous calls. A rubato-backed converter ships in this
//! crate ([`crate::RubatoConverter`]); synthesis and stretching come from
//! the caller.

use crate::error::Result;
use talkover_core::AudioBuffer;

/// Text-to-speech synthesis.
pub trait CommentSynthesizer {
    /// Output sample rate, fixed per configured voice.
    fn sample_rate(&self) -> u32;

    /// Synthesize spoken audio for `text` at [`sample_rate`](Self::sample_rate).
    fn synthesize(&mut self, text: &str) -> Result<AudioBuffer>;
}

/// Time-scale modification: duration scaled by `alpha`, pitch preserved.
pub trait TimeStretcher {
    fn stretch(&mut self, clip: &AudioBuffer, alpha: f64) -> Result<AudioBuffer>;
}

/// Sample-rate conversion of a complete buffer.
pub trait SampleRateConverter {
    fn resample(&mut self, buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer>;
}

/// Cut leading and trailing near-silence from a clip.
///
/// Frames more than `top_db` below the clip's peak count as silence, as in
/// the usual trim convention for speech snippets. A clip with no audible
/// frame trims to nothing.
pub fn trim_silence(clip: &AudioBuffer, top_db: f64) -> AudioBuffer {
    let peak = clip.peak();
    if peak == 0.0 {
        return clip.window(0, 0);
    }
    let threshold = peak * 10.0_f64.powf(-top_db / 20.0) as f32;

    let audible = |frame: usize| {
        clip.channels()
            .iter()
            .any(|ch| ch[frame].abs() > threshold)
    };
    let frames = clip.num_frames();
    let first = (0..frames).find(|&f| audible(f));
    match first {
        None => clip.window(0, 0),
        Some(first) => {
            let last = (0..frames).rev().find(|&f| audible(f)).unwrap_or(first);
            clip.window(first, last + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_silent_margins() {
        let mut samples = vec![0.0_f32; 100];
        samples.extend(vec![0.5_f32; 50]);
        samples.extend(vec![0.0_f32; 30]);
        let clip = AudioBuffer::mono(samples, 8000).unwrap();

        let trimmed = trim_silence(&clip, 60.0);
        assert_eq!(trimmed.num_frames(), 50);
        assert!(trimmed.channel(0).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn keeps_quiet_tail_above_threshold() {
        let mut samples = vec![0.8_f32; 10];
        samples.extend(vec![0.01_f32; 10]); // -38 dB below peak, audible at top_db=60
        let clip = AudioBuffer::mono(samples, 8000).unwrap();
        assert_eq!(trim_silence(&clip, 60.0).num_frames(), 20);
        // A tighter threshold drops the tail
        assert_eq!(trim_silence(&clip, 20.0).num_frames(), 10);
    }

    #[test]
    fn pure_silence_trims_to_nothing() {
        let clip = AudioBuffer::silence(1, 64, 8000).unwrap();
        assert!(trim_silence(&clip, 60.0).is_empty());
    }
}
