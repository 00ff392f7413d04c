//! Error types for harness-audio
//!
//! Open/close errors are fatal to that call and leave nothing allocated.
//! Write errors abort only that call's append; audio already buffered stays
//! playable. Buffer starvation is not an error (see `stream`).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harness-audio
#[derive(Error, Debug)]
pub enum Error {
    /// Bad bit depth, channel count or sample rate
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    /// Engine, converter or sound allocation failed
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Resampler failed while processing a stream chunk
    #[error("Sample rate conversion failed: {0}")]
    ConversionFailed(String),

    /// Stream handle was never opened or is already closed
    #[error("Unknown audio stream: {0}")]
    UnknownStream(u32),

    /// Sample handle was never allocated or is already released
    #[error("Unknown sample: {0}")]
    UnknownSample(u32),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// CD-audio track decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// CD-audio track file does not exist
    #[error("Music track not found: {}", .0.display())]
    TrackNotFound(PathBuf),

    /// Operation not valid in the current sound state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration errors from harness-common
    #[error(transparent)]
    Config(#[from] harness_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using harness-audio Error
pub type Result<T> = std::result::Result<T, Error>;
