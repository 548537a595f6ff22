//! Comment placement and loudness matching
//!
//! A comment clip is anchored to its timestamp, the track pair is grown
//! when the clip falls outside the current buffer, and the clip gain is set
//! so its loudness matches a blend of the recording's local and global
//! loudness before it is summed into the commentary track.

use crate::error::{MixError, Result};
use crate::track::AlignedTracks;
use talkover_core::AudioBuffer;
use talkover_loudness::{normalize_loudness, LoudnessMeter};
use tracing::debug;

/// Placement and loudness-matching parameters for a comment run.
///
/// Defaults mirror typical narration: comments start at their timestamp,
/// 5 dB below the surrounding music, weighting local and global loudness
/// equally.
#[derive(Debug, Clone)]
pub struct PlacementOptions {
    /// Playback speed of the synthesized comments; 1.0 leaves clips alone
    pub speed: f64,
    /// Minimum comment duration in seconds, if bounded
    pub min_duration: Option<f64>,
    /// Maximum comment duration in seconds, if bounded
    pub max_duration: Option<f64>,
    /// Where the clip sits relative to its timestamp: 0 starts at it,
    /// 0.5 centers on it, 1 ends at it
    pub pos_rel: f64,
    /// Offset in seconds added to every timestamp
    pub pos_offset: f64,
    /// Offset in dB against the local loudness of the recording
    pub local_offset_db: f64,
    /// Offset in dB against the global loudness of the recording
    pub global_offset_db: f64,
    /// Blend between local (1.0) and global (0.0) loudness targets
    pub local_weight: f64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            min_duration: None,
            max_duration: None,
            pos_rel: 0.0,
            pos_offset: 0.0,
            local_offset_db: -5.0,
            global_offset_db: -5.0,
            local_weight: 0.5,
        }
    }
}

impl PlacementOptions {
    /// Check the option domains before any processing starts.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_duration, self.max_duration) {
            if min > max {
                return Err(MixError::DurationRange { min, max });
            }
        }
        if self.speed <= 0.0 {
            return Err(MixError::InvalidSpeed(self.speed));
        }
        if !(0.0..=1.0).contains(&self.pos_rel) {
            return Err(MixError::PositionOutOfRange(self.pos_rel));
        }
        if !(0.0..=1.0).contains(&self.local_weight) {
            return Err(MixError::WeightOutOfRange(self.local_weight));
        }
        Ok(())
    }
}

/// Time-stretch factor for a clip, honoring speed and duration bounds.
///
/// The base factor is `1/speed`; if the resulting duration falls outside
/// the configured bounds, the factor is rescaled proportionally to land on
/// the violated bound. A factor of exactly 1.0 means no stretch call is
/// needed.
pub fn stretch_factor(clip_frames: usize, sample_rate: u32, options: &PlacementOptions) -> f64 {
    let mut alpha = 1.0 / options.speed;
    if clip_frames == 0 {
        return 1.0;
    }

    let duration = alpha * clip_frames as f64 / f64::from(sample_rate);
    if let Some(min) = options.min_duration.filter(|&min| duration < min) {
        alpha *= min / duration;
    } else if let Some(max) = options.max_duration.filter(|&max| duration > max) {
        alpha *= max / duration;
    }
    alpha
}

/// Where a clip ended up and how it was scaled.
#[derive(Debug, Clone, Copy)]
pub struct PlacedClip {
    /// First frame of the clip in the (possibly re-padded) track
    pub start_frame: usize,
    /// One past the last frame
    pub end_frame: usize,
    /// Loudness target the clip was matched to, in LUFS
    pub target_lufs: f64,
    /// Linear gain applied to hit the target
    pub gain: f32,
}

/// Places one clip after another into an [`AlignedTracks`] pair.
///
/// The placer itself is stateless; all carried state (buffer length, left
/// pad) lives in the track pair, which is why comments must be placed in
/// list order.
pub struct CommentPlacer<'a> {
    meter: &'a LoudnessMeter,
    options: &'a PlacementOptions,
    global_lufs: f64,
}

impl<'a> CommentPlacer<'a> {
    /// `global_lufs` is the integrated loudness of the whole recording,
    /// measured once up front.
    pub fn new(
        meter: &'a LoudnessMeter,
        options: &'a PlacementOptions,
        global_lufs: f64,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            meter,
            options,
            global_lufs,
        })
    }

    /// Mix `clip` into the commentary track at `at_secs`, growing both
    /// buffers as needed.
    pub fn place(
        &self,
        tracks: &mut AlignedTracks,
        at_secs: f64,
        clip: &AudioBuffer,
    ) -> Result<PlacedClip> {
        if clip.num_channels() != tracks.num_channels() {
            return Err(MixError::ChannelMismatch {
                clip: clip.num_channels(),
                track: tracks.num_channels(),
            });
        }
        if clip.sample_rate() != tracks.sample_rate() {
            return Err(MixError::SampleRateMismatch {
                clip: clip.sample_rate(),
                track: tracks.sample_rate(),
            });
        }

        let rate = f64::from(tracks.sample_rate());
        let clip_frames = clip.num_frames();

        // Nominal start from the timestamp, then into actual indices via
        // the accumulated left pad
        let nominal = ((at_secs + self.options.pos_offset) * rate
            - self.options.pos_rel * clip_frames as f64)
            .round() as i64;
        let offset = nominal + tracks.left_pad() as i64;

        let start = if offset < 0 {
            // Grow to the left by the full deficit so the clip lands at
            // index zero and every later timestamp shifts with it
            let deficit = (-offset) as usize;
            tracks.prepend_zeros(deficit);
            0
        } else {
            offset as usize
        };
        let end = start + clip_frames;

        if end > tracks.num_frames() {
            tracks.append_zeros(end - tracks.num_frames());
        }

        // Match the clip against the music it will sit on top of
        let local_lufs = self.meter.measure(&tracks.program_window(start, end))?;
        let clip_lufs = self.meter.measure(clip)?;
        let w = self.options.local_weight;
        let target_lufs = w * (local_lufs + self.options.local_offset_db)
            + (1.0 - w) * (self.global_lufs + self.options.global_offset_db);

        let mut adjusted = clip.clone();
        let gain = normalize_loudness(&mut adjusted, clip_lufs, target_lufs);
        tracks.add_clip(&adjusted, start)?;

        debug!(
            at_secs,
            start, end, local_lufs, clip_lufs, target_lufs, "placed comment clip"
        );
        Ok(PlacedClip {
            start_frame: start,
            end_frame: end,
            target_lufs,
            gain,
        })
    }
}
