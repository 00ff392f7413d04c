//! Integration tests for config file resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not cause failure (defaults + reported source)
//! - Priority order: CLI argument > HARNESS_CONFIG > platform default
//! - Malformed files are reported as configuration errors
//!
//! Note: Uses serial_test to prevent races on the HARNESS_CONFIG variable.
//! Tests that touch the environment are marked with #[serial].

use harness_common::config::{resolve_config_path, ConfigSource, CONFIG_ENV_VAR};
use harness_common::{BackendKind, Error, TomlConfig};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_argument_takes_priority_over_env() {
    let dir = TempDir::new().unwrap();
    let cli_path = write_config(&dir, "cli.toml", "[audio]\nsample_rate = 22050\n");
    let env_path = write_config(&dir, "env.toml", "[audio]\nsample_rate = 48000\n");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let (config, source) = TomlConfig::load_or_default(Some(&cli_path)).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.audio.sample_rate, 22050);
    assert_eq!(source, ConfigSource::File(cli_path));
}

#[test]
#[serial]
fn test_env_variable_used_without_cli_argument() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(
        &dir,
        "env.toml",
        "[audio]\nbackend = \"null\"\n\n[logging]\nlevel = \"warn\"\n",
    );

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(None);
    let (config, source) = TomlConfig::load_or_default(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(env_path.clone()));
    assert_eq!(config.audio.backend, BackendKind::Null);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(source, ConfigSource::File(env_path));
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does_not_exist.toml");

    env::remove_var(CONFIG_ENV_VAR);
    let (config, source) = TomlConfig::load_or_default(Some(&missing)).unwrap();

    assert_eq!(source, ConfigSource::Missing(missing));
    assert_eq!(config.audio.sample_rate, 44100);
    assert_eq!(config.audio.backend, BackendKind::Mixer);
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "broken.toml", "[audio\nsample_rate = ");

    let result = TomlConfig::load_or_default(Some(&path));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("broken.toml"), "message: {}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_full_config_round_trip_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "harness.toml",
        r#"
[audio]
backend = "mixer"
device = "none"
sample_rate = 48000
channels = 2
buffer_size = 1024
master_volume = 0.8
music_dir = "/data/music"
music_extension = "wav"

[logging]
level = "trace"
file = "harness.log"
"#,
    );

    let config = TomlConfig::load(&path).unwrap();
    assert!(!config.audio.wants_device());
    assert_eq!(config.audio.sample_rate, 48000);
    assert_eq!(config.audio.buffer_size, Some(1024));
    assert!((config.audio.master_volume - 0.8).abs() < f32::EPSILON);
    assert_eq!(config.audio.music_dir, PathBuf::from("/data/music"));
    assert_eq!(config.audio.music_extension, "wav");
    assert_eq!(config.logging.file, Some(PathBuf::from("harness.log")));
}
