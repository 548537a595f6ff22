//! Error types for the core data model

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when constructing core types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Buffer created with no channels
    #[error("Audio buffer must have at least one channel")]
    NoChannels,

    /// Buffer created with more channels than the L/R/C/Ls/Rs layout allows
    #[error("Audio buffer has {0} channels (must be 1-5)")]
    TooManyChannels(usize),

    /// Channels of a planar buffer differ in length
    #[error("Channel {channel} has {actual} frames, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// Sample rate of zero
    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,
}
