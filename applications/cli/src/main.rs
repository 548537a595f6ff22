//! Talkover CLI - mix spoken comment clips into a music recording
//!
//! Takes a recording, a JSON comment list and a directory of pre-rendered
//! spoken clips (WAV), and writes the recording with the clips mixed in at
//! their timestamps, loudness-matched to the music. The clip files play the
//! role the TTS engine plays in a fully synthesized setup: the "text" of
//! each comment is the path of its clip.

use anyhow::{bail, Context, Result};
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use talkover_core::{AudioBuffer, TimedEvent};
use talkover_mix::{
    Commenter, CommenterConfig, CommentSynthesizer, MixError, PlacementOptions, RubatoConverter,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "talkover")]
#[command(about = "Mix spoken comment clips into a music recording", long_about = None)]
struct Cli {
    /// Recording to annotate (WAV)
    input: PathBuf,

    /// Comment list: JSON array of {"time": seconds, "clip": "path.wav"},
    /// clip paths resolved relative to this file
    #[arg(short, long)]
    comments: PathBuf,

    /// Output WAV path (32-bit float)
    #[arg(short, long)]
    output: PathBuf,

    /// Also write the isolated comment track here
    #[arg(long)]
    comment_track: Option<PathBuf>,

    /// Clip position relative to its timestamp: 0 starts there, 1 ends there
    #[arg(long, default_value_t = 0.0)]
    pos_rel: f64,

    /// Offset in seconds applied to every timestamp
    #[arg(long, default_value_t = 0.0)]
    pos_offset: f64,

    /// Comment level in dB relative to the local loudness of the music
    #[arg(long, default_value_t = -5.0)]
    local_offset_db: f64,

    /// Comment level in dB relative to the global loudness of the music
    #[arg(long, default_value_t = -5.0)]
    global_offset_db: f64,

    /// Blend between local (1) and global (0) loudness targets
    #[arg(long, default_value_t = 0.5)]
    local_weight: f64,

    /// Log every placed comment
    #[arg(short, long)]
    verbose: bool,
}

#[derive(serde::Deserialize)]
struct CommentEntry {
    time: f64,
    clip: PathBuf,
}

/// Serves pre-rendered spoken clips; the comment "text" is the clip path.
struct ClipLibrary {
    sample_rate: u32,
    base_dir: PathBuf,
}

impl CommentSynthesizer for ClipLibrary {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&mut self, text: &str) -> talkover_mix::Result<AudioBuffer> {
        let path = self.base_dir.join(text);
        let clip =
            read_wav(&path).map_err(|e| MixError::Synthesis(format!("{}: {e:#}", path.display())))?;
        if clip.sample_rate() != self.sample_rate {
            return Err(MixError::SampleRateMismatch {
                clip: clip.sample_rate(),
                track: self.sample_rate,
            });
        }
        Ok(clip)
    }
}

fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mut planar: Vec<Vec<f32>> =
        vec![Vec::with_capacity(interleaved.len() / channels.max(1)); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &sample) in planar.iter_mut().zip(frame) {
            ch.push(sample);
        }
    }
    AudioBuffer::new(planar, spec.sample_rate)
        .with_context(|| format!("{} has an unsupported channel layout", path.display()))
}

fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for frame in 0..buffer.num_frames() {
        for ch in buffer.channels() {
            writer.write_sample(ch[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.verbose { "info" } else { "warn" })
        }))
        .init();

    let program = read_wav(&cli.input)?;
    info!(
        rate = program.sample_rate(),
        channels = program.num_channels(),
        secs = program.duration_secs(),
        "loaded recording"
    );

    let comment_json = std::fs::read_to_string(&cli.comments)
        .with_context(|| format!("reading {}", cli.comments.display()))?;
    let entries: Vec<CommentEntry> =
        serde_json::from_str(&comment_json).context("parsing comment list")?;

    let base_dir = cli
        .comments
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    // The first clip fixes the working rate; remaining clips must match it
    let sample_rate = match entries.first() {
        Some(entry) => {
            let path = base_dir.join(&entry.clip);
            WavReader::open(&path)
                .with_context(|| format!("opening {}", path.display()))?
                .spec()
                .sample_rate
        }
        None => program.sample_rate(),
    };

    let comments: Vec<TimedEvent<String>> = entries
        .iter()
        .map(|entry| {
            let Some(clip) = entry.clip.to_str() else {
                bail!("clip path {} is not valid UTF-8", entry.clip.display());
            };
            Ok(TimedEvent::new(entry.time, clip.to_owned()))
        })
        .collect::<Result<_>>()?;

    let config = CommenterConfig {
        placement: PlacementOptions {
            pos_rel: cli.pos_rel,
            pos_offset: cli.pos_offset,
            local_offset_db: cli.local_offset_db,
            global_offset_db: cli.global_offset_db,
            local_weight: cli.local_weight,
            ..PlacementOptions::default()
        },
        return_comment_track: cli.comment_track.is_some(),
        announce_progress: cli.verbose,
        ..CommenterConfig::default()
    };

    let mut commenter = Commenter::new(
        Box::new(ClipLibrary {
            sample_rate,
            base_dir,
        }),
        Box::new(RubatoConverter::new()),
        config,
    )?;
    let output = commenter.render(&program, &comments)?;

    write_wav(&cli.output, &output.commented)?;
    info!(path = %cli.output.display(), "wrote commented mix");

    if let Some(path) = &cli.comment_track {
        let track = output
            .comment_track
            .as_ref()
            .expect("comment track was requested from the pipeline");
        write_wav(path, track)?;
        info!(path = %path.display(), "wrote comment track");
    }

    Ok(())
}
