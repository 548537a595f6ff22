//! Pipeline end-to-end tests with stub collaborators
//!
//! The synthesizer and stretcher stand in for their external counterparts:
//! a fixed tone with silent margins instead of TTS, linear interpolation
//! instead of pitch-preserving TSM. Placement, loudness matching and rate
//! conversion are the real implementations.

use talkover_core::{AudioBuffer, TimedEvent};
use talkover_mix::{
    Commenter, CommenterConfig, CommentSynthesizer, MixError, PlacementOptions, Result,
    RubatoConverter, TimeStretcher,
};

const SOURCE_RATE: u32 = 44100;
const WORK_RATE: u32 = 22050;

/// Stands in for TTS: a 660 Hz tone with 50 ms of silence on both sides.
struct ToneSynth;

impl CommentSynthesizer for ToneSynth {
    fn sample_rate(&self) -> u32 {
        WORK_RATE
    }

    fn synthesize(&mut self, _text: &str) -> Result<AudioBuffer> {
        let margin = (0.05 * f64::from(WORK_RATE)) as usize;
        let tone_frames = (0.25 * f64::from(WORK_RATE)) as usize;

        let mut samples = vec![0.0_f32; margin];
        samples.extend((0..tone_frames).map(|n| {
            0.4 * (2.0 * std::f64::consts::PI * 660.0 * n as f64 / f64::from(WORK_RATE)).sin()
                as f32
        }));
        samples.extend(vec![0.0_f32; margin]);
        Ok(AudioBuffer::mono(samples, WORK_RATE)?)
    }
}

/// Stands in for pitch-preserving TSM; duration is all these tests check.
struct LinearStretcher;

impl TimeStretcher for LinearStretcher {
    fn stretch(&mut self, clip: &AudioBuffer, alpha: f64) -> Result<AudioBuffer> {
        let out_frames = (clip.num_frames() as f64 * alpha).round() as usize;
        let channels = clip
            .channels()
            .iter()
            .map(|ch| {
                (0..out_frames)
                    .map(|i| {
                        let src = i as f64 / alpha;
                        let base = src.floor() as usize;
                        let frac = src - base as f64;
                        let a = ch.get(base).copied().unwrap_or(0.0);
                        let b = ch.get(base + 1).copied().unwrap_or(a);
                        (f64::from(a) * (1.0 - frac) + f64::from(b) * frac) as f32
                    })
                    .collect()
            })
            .collect();
        Ok(AudioBuffer::new(channels, clip.sample_rate())?)
    }
}

fn quiet_program(secs: f64) -> AudioBuffer {
    let frames = (secs * f64::from(SOURCE_RATE)) as usize;
    let samples = (0..frames)
        .map(|n| {
            0.05 * (2.0 * std::f64::consts::PI * 220.0 * n as f64 / f64::from(SOURCE_RATE)).sin()
                as f32
        })
        .collect();
    AudioBuffer::mono(samples, SOURCE_RATE).unwrap()
}

fn config() -> CommenterConfig {
    CommenterConfig {
        placement: PlacementOptions {
            local_offset_db: 0.0,
            global_offset_db: 0.0,
            local_weight: 1.0,
            ..PlacementOptions::default()
        },
        return_comment_track: true,
        ..CommenterConfig::default()
    }
}

/// First and last frame with audible content, if any.
fn audible_span(samples: &[f32]) -> Option<(usize, usize)> {
    let first = samples.iter().position(|&s| s.abs() > 1e-4)?;
    let last = samples.iter().rposition(|&s| s.abs() > 1e-4)?;
    Some((first, last))
}

#[test]
fn renders_a_comment_at_its_timestamp() {
    let mut commenter = Commenter::new(
        Box::new(ToneSynth),
        Box::new(RubatoConverter::new()),
        config(),
    )
    .unwrap();
    assert_eq!(commenter.working_rate(), WORK_RATE);

    let program = quiet_program(1.0);
    let comments = vec![TimedEvent::new(0.5, "G. major.".to_owned())];
    let output = commenter.render(&program, &comments).unwrap();

    // Back at the source rate, no growth: the clip fits inside the program
    assert_eq!(output.commented.sample_rate(), SOURCE_RATE);
    assert_eq!(output.commented.num_frames(), 44100);

    let track = output.comment_track.expect("comment track was requested");
    assert_eq!(track.num_frames(), 44100);

    // The trimmed 0.25 s tone sits at t=0.5
    let (first, last) = audible_span(track.channel(0)).expect("comment track has content");
    let expected_start = (0.5 * f64::from(SOURCE_RATE)) as usize;
    let expected_end = expected_start + (0.25 * f64::from(SOURCE_RATE)) as usize;
    let tolerance = (0.02 * f64::from(SOURCE_RATE)) as usize;
    assert!(
        first.abs_diff(expected_start) < tolerance,
        "comment starts at {first}, expected about {expected_start}"
    );
    assert!(
        last.abs_diff(expected_end) < tolerance,
        "comment ends at {last}, expected about {expected_end}"
    );
}

#[test]
fn early_comment_grows_the_output() {
    let placement = PlacementOptions {
        pos_rel: 1.0, // clip ends at its timestamp
        local_offset_db: 0.0,
        global_offset_db: 0.0,
        local_weight: 1.0,
        ..PlacementOptions::default()
    };
    let mut commenter = Commenter::new(
        Box::new(ToneSynth),
        Box::new(RubatoConverter::new()),
        CommenterConfig {
            placement,
            return_comment_track: true,
            ..CommenterConfig::default()
        },
    )
    .unwrap();

    let program = quiet_program(1.0);
    let comments = vec![TimedEvent::new(0.0, "One.".to_owned())];
    let output = commenter.render(&program, &comments).unwrap();

    // The clip hangs entirely off the left edge, so the output grows by
    // roughly its trimmed duration
    assert!(output.commented.num_frames() > 44100);
    let track = output.comment_track.unwrap();
    assert_eq!(track.num_frames(), output.commented.num_frames());

    // And the comment now sits at the very start
    let (first, _) = audible_span(track.channel(0)).unwrap();
    assert!(first < (0.02 * f64::from(SOURCE_RATE)) as usize);
}

#[test]
fn duration_cap_requires_a_stretcher() {
    let placement = PlacementOptions {
        max_duration: Some(0.1), // tone synthesizes at 0.25 s
        ..PlacementOptions::default()
    };
    let mut commenter = Commenter::new(
        Box::new(ToneSynth),
        Box::new(RubatoConverter::new()),
        CommenterConfig {
            placement,
            ..CommenterConfig::default()
        },
    )
    .unwrap();

    let result = commenter.render(&quiet_program(1.0), &[TimedEvent::new(0.2, "X.".to_owned())]);
    assert!(matches!(result, Err(MixError::StretcherMissing)));
}

#[test]
fn duration_cap_shrinks_the_comment() {
    let placement = PlacementOptions {
        max_duration: Some(0.15),
        local_offset_db: 0.0,
        global_offset_db: 0.0,
        local_weight: 1.0,
        ..PlacementOptions::default()
    };
    let mut commenter = Commenter::new(
        Box::new(ToneSynth),
        Box::new(RubatoConverter::new()),
        CommenterConfig {
            placement,
            return_comment_track: true,
            ..CommenterConfig::default()
        },
    )
    .unwrap()
    .with_stretcher(Box::new(LinearStretcher));

    let output = commenter
        .render(&quiet_program(1.0), &[TimedEvent::new(0.2, "X.".to_owned())])
        .unwrap();

    let track = output.comment_track.unwrap();
    let (first, last) = audible_span(track.channel(0)).unwrap();
    let span_secs = (last - first) as f64 / f64::from(SOURCE_RATE);
    assert!(
        (span_secs - 0.15).abs() < 0.03,
        "capped comment spans {span_secs} s"
    );
}

#[test]
fn invalid_duration_range_fails_before_processing() {
    let placement = PlacementOptions {
        min_duration: Some(2.0),
        max_duration: Some(1.0),
        ..PlacementOptions::default()
    };
    let result = Commenter::new(
        Box::new(ToneSynth),
        Box::new(RubatoConverter::new()),
        CommenterConfig {
            placement,
            ..CommenterConfig::default()
        },
    );
    assert!(matches!(result, Err(MixError::DurationRange { .. })));
}
