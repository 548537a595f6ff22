//! Comment rendering pipeline
//!
//! Sequences the full run: resample the recording to the synthesis rate,
//! measure its global loudness once, then synthesize, trim, duration-adjust
//! and place every comment in order, and finally mix down and resample back
//! to the recording's rate.

use crate::collab::{trim_silence, CommentSynthesizer, SampleRateConverter, TimeStretcher};
use crate::error::{MixError, Result};
use crate::placement::{stretch_factor, CommentPlacer, PlacementOptions};
use crate::track::AlignedTracks;
use talkover_core::{AudioBuffer, TimedEvent};
use talkover_loudness::LoudnessMeter;
use tracing::{debug, info};

/// Configuration for a [`Commenter`] run.
#[derive(Debug, Clone)]
pub struct CommenterConfig {
    pub placement: PlacementOptions,
    /// dB below the clip peak treated as silence when trimming margins
    pub trim_threshold_db: f64,
    /// Also return the isolated commentary track
    pub return_comment_track: bool,
    /// Report each placed comment at info level instead of debug.
    /// Purely cosmetic.
    pub announce_progress: bool,
}

impl Default for CommenterConfig {
    fn default() -> Self {
        Self {
            placement: PlacementOptions::default(),
            trim_threshold_db: 60.0,
            return_comment_track: false,
            announce_progress: false,
        }
    }
}

/// Result of a pipeline run.
pub struct CommenterOutput {
    /// Recording plus commentary, at the recording's original sample rate
    pub commented: AudioBuffer,
    /// Commentary alone, when requested
    pub comment_track: Option<AudioBuffer>,
}

/// Mixes synthesized comments into a recording.
///
/// The synthesizer and time stretcher are external collaborators; the
/// converter defaults to the in-crate rubato wrapper in typical use. The
/// meter operates at the synthesizer's output rate, where all placement
/// happens.
pub struct Commenter {
    synthesizer: Box<dyn CommentSynthesizer>,
    stretcher: Option<Box<dyn TimeStretcher>>,
    converter: Box<dyn SampleRateConverter>,
    meter: LoudnessMeter,
    config: CommenterConfig,
}

impl Commenter {
    pub fn new(
        synthesizer: Box<dyn CommentSynthesizer>,
        converter: Box<dyn SampleRateConverter>,
        config: CommenterConfig,
    ) -> Result<Self> {
        config.placement.validate()?;
        let meter = LoudnessMeter::new(synthesizer.sample_rate());
        Ok(Self {
            synthesizer,
            stretcher: None,
            converter,
            meter,
            config,
        })
    }

    /// Attach a time-scale-modification collaborator. Without one, any
    /// comment that needs stretching fails the run.
    pub fn with_stretcher(mut self, stretcher: Box<dyn TimeStretcher>) -> Self {
        self.stretcher = Some(stretcher);
        self
    }

    /// Sample rate comments are synthesized and placed at.
    pub fn working_rate(&self) -> u32 {
        self.meter.sample_rate()
    }

    /// Render `comments` into `program`.
    ///
    /// Comments are processed strictly in list order; timestamps are not
    /// sorted first. An unsorted list still renders, but left padding then
    /// depends on the encounter order of early comments.
    pub fn render(
        &mut self,
        program: &AudioBuffer,
        comments: &[TimedEvent<String>],
    ) -> Result<CommenterOutput> {
        let source_rate = program.sample_rate();
        let work_rate = self.working_rate();

        let resampled = self.converter.resample(program, work_rate)?;
        let global_lufs = self.meter.measure(&resampled)?;
        debug!(global_lufs, work_rate, "analyzed program loudness");

        let placer = CommentPlacer::new(&self.meter, &self.config.placement, global_lufs)?;
        let mut tracks = AlignedTracks::new(resampled);

        for (index, comment) in comments.iter().enumerate() {
            if self.config.announce_progress {
                info!(
                    index,
                    total = comments.len(),
                    time = comment.time,
                    text = %comment.value,
                    "placing comment"
                );
            } else {
                debug!(index, time = comment.time, text = %comment.value, "placing comment");
            }

            let clip = self.synthesizer.synthesize(&comment.value)?;
            if clip.sample_rate() != work_rate {
                return Err(MixError::SampleRateMismatch {
                    clip: clip.sample_rate(),
                    track: work_rate,
                });
            }
            let clip = trim_silence(&clip, self.config.trim_threshold_db);

            let alpha = stretch_factor(clip.num_frames(), work_rate, &self.config.placement);
            let clip = if alpha == 1.0 {
                clip
            } else {
                match self.stretcher.as_mut() {
                    Some(stretcher) => stretcher.stretch(&clip, alpha)?,
                    None => return Err(MixError::StretcherMissing),
                }
            };

            placer.place(&mut tracks, comment.time, &clip)?;
        }

        let commented = self.converter.resample(&tracks.mixdown(), source_rate)?;
        let comment_track = if self.config.return_comment_track {
            Some(self.converter.resample(tracks.commentary(), source_rate)?)
        } else {
            None
        };

        Ok(CommenterOutput {
            commented,
            comment_track,
        })
    }
}
