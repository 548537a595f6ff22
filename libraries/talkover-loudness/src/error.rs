//! Error types for loudness measurement

use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness measurement
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// More channels than the BS.1770 channel gain table covers
    #[error("Signal has {0} channels (loudness is defined for 1-5)")]
    TooManyChannels(usize),

    /// Buffer sample rate differs from the rate the meter was built for
    #[error("Buffer sample rate {buffer} Hz does not match meter rate {meter} Hz")]
    SampleRateMismatch { meter: u32, buffer: u32 },
}
