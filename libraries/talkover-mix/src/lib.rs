//! Comment placement and mixing for Talkover
//!
//! This crate takes a recording and a list of timestamped spoken comments
//! and mixes the comments into the recording, loudness-matched against the
//! music around them.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ Annotations│ ─►│  Formatters  │ ─►│ TimedEvent list │
//! └────────────┘   └──────────────┘   └───────┬────────┘
//!                                             ▼
//!            ┌─────────────┐  synthesize  ┌──────────┐
//!            │  Commenter  │ ───────────► │   clip   │
//!            └──────┬──────┘  trim/adjust └────┬─────┘
//!                   ▼                          ▼
//!            ┌──────────────┐  place    ┌──────────────┐
//!            │ AlignedTracks│ ◄──────── │ CommentPlacer│
//!            └──────┬───────┘           └──────────────┘
//!                   ▼ mixdown + resample
//!            ┌──────────────┐
//!            │ commented mix│ (+ optional isolated comment track)
//!            └──────────────┘
//! ```
//!
//! The placement loop is deliberately sequential: buffer length and the
//! left-pad offset carry from one comment to the next, so comments are
//! placed strictly in list order.

#![deny(unsafe_code)]

mod annotations;
mod collab;
mod error;
mod pipeline;
mod placement;
mod resample;
mod track;

pub use annotations::{
    leitmotif_comments, measure_comments, structure_comments, ChordVocabulary,
};
pub use collab::{trim_silence, CommentSynthesizer, SampleRateConverter, TimeStretcher};
pub use error::{MixError, Result};
pub use pipeline::{Commenter, CommenterConfig, CommenterOutput};
pub use placement::{stretch_factor, CommentPlacer, PlacedClip, PlacementOptions};
pub use resample::RubatoConverter;
pub use track::AlignedTracks;
