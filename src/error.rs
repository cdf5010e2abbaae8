//! Error types for the repet crate.

use thiserror::Error;

/// Errors that can occur during background/foreground separation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeparationError {
    /// Sample rate must be positive.
    #[error("invalid sample rate: {0}. Must be greater than 0")]
    InvalidSampleRate(u32),
    /// Channel count must be at least one.
    #[error("invalid channel count: {0}. Must be at least 1")]
    InvalidChannels(u16),
    /// The input signal holds no samples.
    #[error("empty signal: at least one sample per channel is required")]
    EmptySignal,
    /// Two cooperating buffers disagree on their channel count.
    #[error("channel count mismatch: expected {expected}, found {found}")]
    ChannelMismatch { expected: usize, found: usize },
    /// Two cooperating buffers (or channels) disagree on their length.
    #[error("length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// A streaming chunk does not hold a whole number of interleaved frames.
    #[error("chunk of {len} samples is not a multiple of {channels} channels")]
    MisalignedChunk { len: usize, channels: usize },
    /// The input contains NaN or infinite samples.
    #[error("input contains NaN or infinite samples")]
    NonFiniteInput,
    /// A separation parameter is out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// I/O error while persisting parameters.
    #[error("I/O error: {0}")]
    Io(String),
    /// Parameter (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for SeparationError {
    fn from(err: std::io::Error) -> Self {
        SeparationError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SeparationError {
    fn from(err: serde_json::Error) -> Self {
        SeparationError::Serialization(err.to_string())
    }
}
