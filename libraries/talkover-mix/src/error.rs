//! Error types for comment placement and mixing

use thiserror::Error;

/// Result type for mixing operations
pub type Result<T> = std::result::Result<T, MixError>;

/// Errors that can occur while placing and mixing comments
#[derive(Error, Debug)]
pub enum MixError {
    /// Configured minimum comment duration exceeds the maximum
    #[error("Minimum comment duration {min} s exceeds maximum {max} s")]
    DurationRange { min: f64, max: f64 },

    /// Comment speed must be strictly positive
    #[error("Comment speed must be positive, got {0}")]
    InvalidSpeed(f64),

    /// Relative position outside [0, 1]
    #[error("Relative comment position must lie in [0, 1], got {0}")]
    PositionOutOfRange(f64),

    /// Local/global loudness weight outside [0, 1]
    #[error("Local/global loudness weight must lie in [0, 1], got {0}")]
    WeightOutOfRange(f64),

    /// Duration bounds require stretching but no stretcher was configured
    #[error("Comment requires time stretching but no time stretcher is configured")]
    StretcherMissing,

    /// Clip and track channel layouts differ
    #[error("Clip has {clip} channels, track has {track}")]
    ChannelMismatch { clip: usize, track: usize },

    /// Clip and track sample rates differ
    #[error("Clip sample rate {clip} Hz does not match track rate {track} Hz")]
    SampleRateMismatch { clip: u32, track: u32 },

    /// Loudness measurement failed
    #[error(transparent)]
    Loudness(#[from] talkover_loudness::LoudnessError),

    /// Buffer construction failed
    #[error(transparent)]
    Buffer(#[from] talkover_core::CoreError),

    /// Sample rate conversion failed
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Text-to-speech collaborator failed
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Time-scale modification collaborator failed
    #[error("Time stretching failed: {0}")]
    Stretch(String),
}
