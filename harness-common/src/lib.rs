//! # Harness Common Library
//!
//! Shared code for the harness audio crates:
//! - Error type shared by configuration loading
//! - TOML bootstrap configuration and config file resolution
//! - Unit conversion between harness scales (volume 0-255, pan -10000..10000,
//!   playback frequency) and the linear scales used by the sound engine

pub mod config;
pub mod error;
pub mod units;

pub use config::{AudioConfig, BackendKind, LoggingConfig, TomlConfig};
pub use error::{Error, Result};
