//! BS.1770 loudness measurement for Talkover
//!
//! This crate provides:
//! - K-weighting filter cascade (high shelf + high pass) per ITU-R BS.1770
//! - Gated integrated loudness measurement (absolute + relative gate)
//! - Momentary loudness for signals shorter than one gating block
//! - Loudness matching (rescale a clip to a target loudness)
//!
//! The meter accepts arbitrarily short signals: anything longer than the
//! standard 400 ms gating block is measured with the full gating algorithm,
//! anything shorter returns its single-block momentary loudness. Both paths
//! clamp the result upward to a caller-supplied floor, so pure silence
//! measures as the floor rather than negative infinity.
//!
//! # Example
//!
//! ```ignore
//! use talkover_core::AudioBuffer;
//! use talkover_loudness::{normalize_loudness, LoudnessMeter};
//!
//! let meter = LoudnessMeter::new(48000);
//! let mut clip = AudioBuffer::mono(samples, 48000)?;
//!
//! let measured = meter.measure(&clip)?;
//! normalize_loudness(&mut clip, measured, -23.0);
//! ```

#![deny(unsafe_code)]

mod error;
mod filter;
mod meter;
mod normalize;

pub use error::{LoudnessError, Result};
pub use filter::KWeightingFilter;
pub use meter::{
    LoudnessMeter, ABSOLUTE_GATE_LUFS, CHANNEL_GAINS, GATING_BLOCK_OVERLAP, GATING_BLOCK_SECS,
};
pub use normalize::normalize_loudness;
