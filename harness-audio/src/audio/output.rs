//! Audio output using cpal
//!
//! Opens an output device and drives a [`SoundEngine`] from the device
//! callback. The engine is created with the device's rate and channel count
//! so the callback can hand the device buffer straight to the mixer.

use crate::engine::SoundEngine;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
    error_count: Arc<AtomicU32>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Device to open (None = default device)
    /// - `preferred_rate`: Mixing rate to ask the device for
    /// - `preferred_channels`: Channel count to ask the device for
    /// - `buffer_size`: Optional buffer size in frames (None = device default)
    ///
    /// # Errors
    /// `AudioOutput` if neither the requested nor the default device can be
    /// opened or configured.
    ///
    /// # Fallback Behavior
    /// A named device that cannot be found falls back to the default device.
    pub fn new(
        device_name: Option<&str>,
        preferred_rate: u32,
        preferred_channels: u16,
        buffer_size: Option<u32>,
    ) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("Requested device '{}' not found, falling back to default device", name);

                    let default_dev = host.default_output_device().ok_or_else(|| {
                        Error::AudioOutput(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?;

                    info!(
                        "Using default audio device as fallback: {}",
                        default_dev.name().unwrap_or_else(|_| "Unknown".to_string())
                    );
                    default_dev
                }
            }
        } else {
            let dev = host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;

            info!(
                "Using default audio device: {}",
                dev.name().unwrap_or_else(|_| "Unknown".to_string())
            );
            dev
        };

        let (mut config, sample_format) =
            Self::get_best_config(&device, preferred_rate, preferred_channels)?;

        if let Some(size) = buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(size);
            debug!("Using requested buffer size: {} frames", size);
        } else {
            debug!("Using device default buffer size");
        }

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, buffer_size={:?}",
            config.sample_rate.0, config.channels, sample_format, config.buffer_size
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            error_flag: Arc::new(AtomicBool::new(false)),
            error_count: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Pick the supported configuration closest to the preferred one.
    ///
    /// Prefers the requested rate and channel count with f32 samples, then
    /// the requested rate and channels in any format, then the device default.
    fn get_best_config(
        device: &Device,
        preferred_rate: u32,
        preferred_channels: u16,
    ) -> Result<(StreamConfig, SampleFormat)> {
        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?
            .collect();

        let matches = |config: &cpal::SupportedStreamConfigRange| {
            config.channels() == preferred_channels
                && config.min_sample_rate().0 <= preferred_rate
                && config.max_sample_rate().0 >= preferred_rate
        };

        let preferred = supported
            .iter()
            .find(|config| matches(*config) && config.sample_format() == SampleFormat::F32)
            .or_else(|| supported.iter().find(|config| matches(*config)));

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .clone()
                .with_sample_rate(cpal::SampleRate(preferred_rate))
                .config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        warn!(
            "Device does not support {}Hz/{}ch, using default {}Hz/{}ch",
            preferred_rate,
            preferred_channels,
            supported_config.sample_rate().0,
            supported_config.channels()
        );

        let sample_format = supported_config.sample_format();
        let config = supported_config.config();
        Ok((config, sample_format))
    }

    /// Start pulling audio from `engine`.
    ///
    /// The engine must have been created with this output's `sample_rate()`
    /// and `channels()`.
    ///
    /// # Notes
    /// - The callback runs on a real-time audio thread
    /// - Stream errors set a flag checked by `has_error()`
    pub fn start(&mut self, engine: Arc<SoundEngine>) -> Result<()> {
        if engine.channels() != self.config.channels {
            return Err(Error::AudioOutput(format!(
                "engine has {} channels, device has {}",
                engine.channels(),
                self.config.channels
            )));
        }

        info!("Starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream_f32(engine)?,
            SampleFormat::I16 => self.build_stream_i16(engine)?,
            SampleFormat::U16 => self.build_stream_u16(engine)?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);

        info!("Audio stream started successfully");
        Ok(())
    }

    fn error_callback(&self) -> impl FnMut(cpal::StreamError) + Send + 'static {
        let error_flag = Arc::clone(&self.error_flag);
        let error_count = Arc::clone(&self.error_count);
        move |err| {
            error!("Audio stream error: {}", err);
            error_flag.store(true, Ordering::SeqCst);
            error_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn build_stream_f32(&self, engine: Arc<SoundEngine>) -> Result<Stream> {
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine.read_pcm_frames(data);
                },
                self.error_callback(),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    fn build_stream_i16(&self, engine: Arc<SoundEngine>) -> Result<Stream> {
        let mut mix = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    mix.resize(data.len(), 0.0);
                    engine.read_pcm_frames(&mut mix);
                    for (dst, sample) in data.iter_mut().zip(&mix) {
                        *dst = (sample * i16::MAX as f32) as i16;
                    }
                },
                self.error_callback(),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    fn build_stream_u16(&self, engine: Arc<SoundEngine>) -> Result<Stream> {
        let mut mix = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    mix.resize(data.len(), 0.0);
                    engine.read_pcm_frames(&mut mix);
                    // [-1.0, 1.0] -> [0, 65535]
                    for (dst, sample) in data.iter_mut().zip(&mix) {
                        *dst = ((sample + 1.0) * 32767.5) as u16;
                    }
                },
                self.error_callback(),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Stop audio playback.
    ///
    /// Pauses the stream and drops the stream reference.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }

        Ok(())
    }

    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// True if the stream error callback has fired since the last `clear_error`
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::SeqCst)
    }

    pub fn clear_error(&self) {
        self.error_flag.store(false, Ordering::SeqCst);
        self.error_count.store(0, Ordering::SeqCst);
        info!("Audio error state cleared");
    }

    /// Rebuild the stream on the same device after a stream error.
    ///
    /// Call when `has_error()` returns true. The error state is cleared only
    /// if the new stream starts.
    pub fn try_recover(&mut self, engine: Arc<SoundEngine>) -> Result<()> {
        warn!("Attempting audio stream recovery (error count: {})", self.error_count());

        if let Err(e) = self.stop() {
            warn!("Failed to stop stream during recovery: {}", e);
        }

        match self.start(engine) {
            Ok(()) => {
                info!("Audio stream recovery successful");
                self.clear_error();
                Ok(())
            }
            Err(e) => {
                error!("Audio stream recovery failed: {}", e);
                Err(e)
            }
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop audio stream on drop: {}", e);
        }
    }
}
