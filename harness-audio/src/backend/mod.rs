//! Harness audio backend contract
//!
//! The game talks to audio only through [`AudioBackend`]. Every variant
//! exposes the same operations; one without real audio still accepts every
//! call and reports success, so the game never has to know which variant it
//! got. The variant is picked once at startup from configuration.
//!
//! Harness units (volume 0-255, pan -10000..=10000, frequency pairs) are
//! converted with `harness_common::units` in every variant.

mod mixer;
mod null;

pub use mixer::MixerBackend;
pub use null::NullBackend;

use crate::error::Result;
use harness_common::{AudioConfig, BackendKind};
use std::fmt;
use tracing::info;

/// Handle to an open stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub u32);

/// Handle to an allocated one-shot sample voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleHandle(pub u32);

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

impl fmt::Display for SampleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sample#{}", self.0)
    }
}

/// Operations the game harness calls for audio
pub trait AudioBackend {
    /// Short variant name for logs
    fn name(&self) -> &'static str;

    /// Prepare CD-audio playback (checks music files are present)
    fn init_cda(&mut self) -> Result<()>;

    /// Stop and release the current CD track
    fn uninit_cda(&mut self) -> Result<()>;

    /// Stop everything and release all sounds, streams and the device
    fn shutdown(&mut self);

    /// Play CD track `track` once, replacing any current track
    fn play_cda(&mut self, track: i32) -> Result<()>;

    fn stop_cda(&mut self) -> Result<()>;

    fn cda_is_playing(&self) -> bool;

    /// Music volume, 0-255
    fn set_cda_volume(&mut self, volume: i32) -> Result<()>;

    /// Allocate a one-shot sample voice
    fn allocate_sample(&mut self) -> SampleHandle;

    /// Free a voice, stopping it first
    fn release_sample(&mut self, handle: SampleHandle) -> Result<()>;

    /// Play 8-bit unsigned PCM on a voice
    fn play_sample(
        &mut self,
        handle: SampleHandle,
        channels: i32,
        data: &[u8],
        rate: i32,
        looping: bool,
    ) -> Result<()>;

    fn sound_is_playing(&self, handle: SampleHandle) -> bool;

    /// Voice volume, 0-255
    fn set_volume(&mut self, handle: SampleHandle, volume: i32) -> Result<()>;

    /// Voice pan, -10000 (left) to 10000 (right)
    fn set_pan(&mut self, handle: SampleHandle, pan: i32) -> Result<()>;

    /// Play a voice at `new_rate` instead of `original_rate`
    fn set_frequency(&mut self, handle: SampleHandle, original_rate: i32, new_rate: i32)
        -> Result<()>;

    fn stop_sample(&mut self, handle: SampleHandle) -> Result<()>;

    /// Open a PCM stream. None when the variant cannot stream or the format
    /// is rejected.
    fn stream_open(&mut self, bit_depth: i32, channels: i32, sample_rate: u32)
        -> Option<StreamHandle>;

    /// Append PCM to an open stream
    fn stream_write(&mut self, handle: StreamHandle, data: &[u8]) -> Result<()>;

    /// Close a stream. Closing an unknown handle succeeds.
    fn stream_close(&mut self, handle: StreamHandle) -> Result<()>;
}

/// Build the backend variant selected by `config.backend`.
///
/// # Errors
/// Invalid configuration, or engine creation failure for the mixer variant.
/// A missing output device is not an error: the mixer runs detached.
pub fn create_backend(config: &AudioConfig) -> Result<Box<dyn AudioBackend>> {
    let backend: Box<dyn AudioBackend> = match config.backend {
        BackendKind::Mixer => Box::new(MixerBackend::new(config)?),
        BackendKind::Null => Box::new(NullBackend::new()),
    };
    info!("Audio backend: {}", backend.name());
    Ok(backend)
}
