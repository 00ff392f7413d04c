//! Bootstrap configuration loading and config file resolution
//!
//! The harness reads one small TOML file at startup. Settings cannot change
//! while running; restart to pick up edits.
//!
//! # Config file priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `HARNESS_CONFIG` environment variable
//! 3. `<user config dir>/harness/harness.toml` (only when it exists)
//! 4. Built-in defaults (fallback)
//!
//! A missing config file is never fatal: the caller logs a warning and runs
//! with defaults. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HARNESS_CONFIG";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "harness.toml";

/// Lowest accepted engine mixing rate
const MIN_ENGINE_RATE: u32 = 8000;

/// Highest accepted engine mixing rate
const MAX_ENGINE_RATE: u32 = 192_000;

/// Which backend variant to construct at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process sound engine, optionally attached to an output device
    #[default]
    Mixer,
    /// No audio: every call succeeds without doing anything
    Null,
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Audio backend configuration
    #[serde(default)]
    pub audio: AudioConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Audio backend configuration (`[audio]` table)
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Backend variant
    #[serde(default)]
    pub backend: BackendKind,

    /// Output device name, `"default"` for the host default, `"none"` to run
    /// the engine without a device
    #[serde(default = "default_device")]
    pub device: String,

    /// Engine mixing rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Engine output channel count
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Device buffer size in frames (None = device default)
    #[serde(default)]
    pub buffer_size: Option<u32>,

    /// Master volume applied after mixing (0.0 - 1.0)
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,

    /// Directory holding CD-audio tracks (`Track02.ogg`, ...)
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,

    /// File extension of CD-audio tracks
    #[serde(default = "default_music_extension")]
    pub music_extension: String,
}

/// Logging configuration (`[logging]` table)
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was requested but does not exist; defaults were used
    Missing(PathBuf),
    /// No config file was requested or found; defaults were used
    Defaults,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    2
}

fn default_master_volume() -> f32 {
    1.0
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("MUSIC")
}

fn default_music_extension() -> String {
    "ogg".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            device: default_device(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            buffer_size: None,
            master_volume: default_master_volume(),
            music_dir: default_music_dir(),
            music_extension: default_music_extension(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl AudioConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ENGINE_RATE..=MAX_ENGINE_RATE).contains(&self.sample_rate) {
            return Err(Error::InvalidInput(format!(
                "audio.sample_rate {} outside {}..={} Hz",
                self.sample_rate, MIN_ENGINE_RATE, MAX_ENGINE_RATE
            )));
        }
        if self.channels == 0 {
            return Err(Error::InvalidInput(
                "audio.channels must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(Error::InvalidInput(format!(
                "audio.master_volume {} outside 0.0..=1.0",
                self.master_volume
            )));
        }
        if self.buffer_size == Some(0) {
            return Err(Error::InvalidInput(
                "audio.buffer_size must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether an output device should be opened at all
    pub fn wants_device(&self) -> bool {
        !self.device.eq_ignore_ascii_case("none")
    }

    /// Requested device name, or None for the host default
    pub fn device_name(&self) -> Option<&str> {
        if self.device.eq_ignore_ascii_case("default") || !self.wants_device() {
            None
        } else {
            Some(self.device.as_str())
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(toml_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.audio.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - File cannot be read
    /// - File is not valid TOML or holds out-of-range values
    pub fn load(path: &Path) -> Result<Self> {
        let toml_content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Resolve the config file and load it, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Returns
    /// The configuration and where it came from, so the caller can log it once
    /// logging is initialized.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) => Ok((Self::default(), ConfigSource::Missing(path))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }
}

/// Resolve which config file to read.
///
/// Returns None when nothing was requested and no default config file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory, only when the file is present
    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("harness").join(CONFIG_FILE_NAME))
}
