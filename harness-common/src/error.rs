//! Common error types for the harness

use thiserror::Error;

/// Common result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across harness crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value outside its accepted range
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
