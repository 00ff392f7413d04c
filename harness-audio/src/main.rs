//! Harness audio demo (harness-audio) - main entry point
//!
//! Drives the backend the way the game does: streams a file in video-frame
//! sized slices, plays CD-audio tracks, or lists output devices.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harness_audio::audio::{AudioOutput, SampleFormat, TrackDecoder};
use harness_audio::create_backend;
use harness_common::config::ConfigSource;
use harness_common::{LoggingConfig, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for harness-audio
#[derive(Parser, Debug)]
#[command(name = "harness-audio")]
#[command(about = "Game harness audio backend demo")]
#[command(version)]
struct Args {
    /// Config file (overrides HARNESS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device name, "default" or "none" (overrides the config file)
    #[arg(short, long, env = "HARNESS_AUDIO_DEVICE")]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push an audio file through a stream, one video frame of audio per tick
    Stream {
        /// Audio file to stream (wav, ogg, flac, mp3)
        file: PathBuf,

        /// Video frame rate setting the write cadence
        #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..=240))]
        fps: u32,
    },
    /// Play a CD-audio track from the music directory until it ends
    Cda {
        /// Track number (2 is the first music track)
        track: i32,
    },
    /// List output devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(device) = args.device {
        config.audio.device = device;
    }

    init_logging(&config.logging)?;

    match &source {
        ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::Missing(path) => {
            warn!("Config file {} not found, using defaults", path.display())
        }
        ConfigSource::Defaults => info!("No config file, using defaults"),
    }

    match args.command {
        Command::Stream { file, fps } => stream_file(&config, &file, fps).await,
        Command::Cda { track } => play_track(&config, track).await,
        Command::Devices => {
            for name in AudioOutput::list_devices().context("Failed to list devices")? {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

/// Console logging plus an optional plain-text log file
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("harness_audio={0},harness_common={0}", config.level).into()
    });

    let file_layer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

async fn stream_file(config: &TomlConfig, file: &Path, fps: u32) -> Result<()> {
    let decoded = TrackDecoder::decode_file(file)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    let mut pcm = Vec::with_capacity(decoded.samples.len() * 2);
    SampleFormat::S16.encode_into(&decoded.samples, &mut pcm);

    let mut backend = create_backend(&config.audio).context("Failed to create audio backend")?;
    let handle = backend
        .stream_open(16, decoded.channels as i32, decoded.sample_rate)
        .context("Backend did not open a stream")?;

    let frame_size = decoded.channels as usize * 2;
    let frames_per_tick = (decoded.sample_rate / fps).max(1) as usize;
    info!(
        "Streaming {} ({} frames, {}Hz) at {} fps, {} frames per write",
        file.display(),
        decoded.frames(),
        decoded.sample_rate,
        fps,
        frames_per_tick
    );

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut chunks = pcm.chunks(frames_per_tick * frame_size);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match chunks.next() {
                    Some(chunk) => backend
                        .stream_write(handle, chunk)
                        .context("Stream write failed")?,
                    None => break,
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping stream");
                break;
            }
        }
    }

    // Let the last slices play out
    tokio::time::sleep(Duration::from_millis(500)).await;

    backend.stream_close(handle)?;
    backend.shutdown();
    Ok(())
}

async fn play_track(config: &TomlConfig, track: i32) -> Result<()> {
    let mut backend = create_backend(&config.audio).context("Failed to create audio backend")?;
    backend.init_cda().context("CD audio unavailable")?;
    backend
        .play_cda(track)
        .with_context(|| format!("Failed to play track {}", track))?;

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !backend.cda_is_playing() {
                    info!("Track {} finished", track);
                    break;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping track");
                break;
            }
        }
    }

    backend.stop_cda()?;
    backend.uninit_cda()?;
    backend.shutdown();
    Ok(())
}
