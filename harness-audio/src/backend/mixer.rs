//! Backend on the in-crate sound engine

use super::{AudioBackend, SampleHandle, StreamHandle};
use crate::audio::output::AudioOutput;
use crate::cda::CdaPlayer;
use crate::engine::SoundEngine;
use crate::error::{Error, Result};
use crate::sample::SampleVoice;
use crate::stream::AudioStream;
use harness_common::AudioConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Full backend: streams, samples and CD audio mixed by one [`SoundEngine`]
///
/// Owns all process-wide audio state. With `audio.device = "none"`, or when
/// no device can be opened, the engine runs detached and nothing pulls it
/// unless the caller does (`engine().read_pcm_frames`).
pub struct MixerBackend {
    engine: Arc<SoundEngine>,
    output: Option<AudioOutput>,
    cda: CdaPlayer,
    streams: HashMap<StreamHandle, AudioStream>,
    samples: HashMap<SampleHandle, SampleVoice>,
    next_stream: u32,
    next_sample: u32,
}

impl MixerBackend {
    /// Create the engine and, unless disabled, attach it to an output device.
    ///
    /// # Errors
    /// `Config` for out-of-range settings, `BackendInitFailed` if the engine
    /// cannot be created.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        config.validate()?;

        let output = if config.wants_device() {
            match AudioOutput::new(
                config.device_name(),
                config.sample_rate,
                config.channels,
                config.buffer_size,
            ) {
                Ok(output) => Some(output),
                Err(e) => {
                    warn!("No audio output ({}), running engine without a device", e);
                    None
                }
            }
        } else {
            info!("Audio device disabled, running engine without a device");
            None
        };

        // Mix at whatever the device actually accepted
        let (rate, channels) = output
            .as_ref()
            .map(|o| (o.sample_rate(), o.channels()))
            .unwrap_or((config.sample_rate, config.channels));

        let engine = Arc::new(SoundEngine::new(rate, channels)?);
        engine.set_master_volume(config.master_volume);

        let output = match output {
            Some(mut output) => match output.start(Arc::clone(&engine)) {
                Ok(()) => {
                    info!("Audio output on {}", output.device_name());
                    Some(output)
                }
                Err(e) => {
                    warn!("Failed to start audio output ({}), running without a device", e);
                    None
                }
            },
            None => None,
        };

        let cda = CdaPlayer::new(
            Arc::clone(&engine),
            config.music_dir.clone(),
            &config.music_extension,
        );

        Ok(Self {
            engine,
            output,
            cda,
            streams: HashMap::new(),
            samples: HashMap::new(),
            next_stream: 1,
            next_sample: 1,
        })
    }

    pub fn engine(&self) -> &Arc<SoundEngine> {
        &self.engine
    }

    /// True when no device pulls the engine
    pub fn is_detached(&self) -> bool {
        self.output.is_none()
    }

    pub fn stream(&self, handle: StreamHandle) -> Option<&AudioStream> {
        self.streams.get(&handle)
    }

    pub fn sample(&self, handle: SampleHandle) -> Option<&SampleVoice> {
        self.samples.get(&handle)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Open a stream, reporting why it failed.
    ///
    /// `stream_open` wraps this for the harness, which only sees a handle or
    /// nothing.
    pub fn open_stream(
        &mut self,
        bit_depth: i32,
        channels: i32,
        sample_rate: u32,
    ) -> Result<StreamHandle> {
        let stream = AudioStream::open(Arc::clone(&self.engine), bit_depth, channels, sample_rate)?;
        let handle = StreamHandle(self.next_stream);
        self.next_stream = self.next_stream.wrapping_add(1).max(1);
        self.streams.insert(handle, stream);
        debug!("Opened {}", handle);
        Ok(handle)
    }

    /// Rebuild the device stream after a stream error, or run detached if
    /// that fails.
    ///
    /// Polled from the harness calls that start or feed audio.
    pub fn service_output(&mut self) {
        let recovered = match self.output.as_mut() {
            Some(output) if output.has_error() => output.try_recover(Arc::clone(&self.engine)),
            _ => return,
        };

        if let Err(e) = recovered {
            warn!("Audio output lost ({}), running engine without a device", e);
            self.output = None;
        }
    }

    fn voice(&mut self, handle: SampleHandle) -> Result<&mut SampleVoice> {
        self.samples
            .get_mut(&handle)
            .ok_or(Error::UnknownSample(handle.0))
    }
}

impl AudioBackend for MixerBackend {
    fn name(&self) -> &'static str {
        "mixer"
    }

    fn init_cda(&mut self) -> Result<()> {
        self.cda.check_available()
    }

    fn uninit_cda(&mut self) -> Result<()> {
        self.cda.stop();
        debug!("CD audio released");
        Ok(())
    }

    fn shutdown(&mut self) {
        info!(
            "Shutting down audio: {} streams, {} samples",
            self.streams.len(),
            self.samples.len()
        );

        self.cda.stop();
        self.streams.clear();
        for voice in self.samples.values_mut() {
            voice.stop(&self.engine);
        }
        self.samples.clear();

        if let Some(mut output) = self.output.take() {
            if let Err(e) = output.stop() {
                warn!("Failed to stop audio output: {}", e);
            }
        }
    }

    fn play_cda(&mut self, track: i32) -> Result<()> {
        self.service_output();
        self.cda.play(track)
    }

    fn stop_cda(&mut self) -> Result<()> {
        self.cda.stop();
        Ok(())
    }

    fn cda_is_playing(&self) -> bool {
        self.cda.is_playing()
    }

    fn set_cda_volume(&mut self, volume: i32) -> Result<()> {
        self.cda.set_volume(volume);
        Ok(())
    }

    fn allocate_sample(&mut self) -> SampleHandle {
        let handle = SampleHandle(self.next_sample);
        self.next_sample = self.next_sample.wrapping_add(1).max(1);
        self.samples.insert(handle, SampleVoice::new());
        handle
    }

    fn release_sample(&mut self, handle: SampleHandle) -> Result<()> {
        let mut voice = self
            .samples
            .remove(&handle)
            .ok_or(Error::UnknownSample(handle.0))?;
        voice.stop(&self.engine);
        Ok(())
    }

    fn play_sample(
        &mut self,
        handle: SampleHandle,
        channels: i32,
        data: &[u8],
        rate: i32,
        looping: bool,
    ) -> Result<()> {
        self.service_output();
        let engine = Arc::clone(&self.engine);
        self.voice(handle)?
            .play(&engine, channels, data, rate, looping)
    }

    fn sound_is_playing(&self, handle: SampleHandle) -> bool {
        self.samples
            .get(&handle)
            .map(SampleVoice::is_playing)
            .unwrap_or(false)
    }

    fn set_volume(&mut self, handle: SampleHandle, volume: i32) -> Result<()> {
        self.voice(handle)?.set_volume(volume);
        Ok(())
    }

    fn set_pan(&mut self, handle: SampleHandle, pan: i32) -> Result<()> {
        self.voice(handle)?.set_pan(pan);
        Ok(())
    }

    fn set_frequency(
        &mut self,
        handle: SampleHandle,
        original_rate: i32,
        new_rate: i32,
    ) -> Result<()> {
        self.voice(handle)?.set_frequency(original_rate, new_rate);
        Ok(())
    }

    fn stop_sample(&mut self, handle: SampleHandle) -> Result<()> {
        let engine = Arc::clone(&self.engine);
        self.voice(handle)?.stop(&engine);
        Ok(())
    }

    fn stream_open(
        &mut self,
        bit_depth: i32,
        channels: i32,
        sample_rate: u32,
    ) -> Option<StreamHandle> {
        match self.open_stream(bit_depth, channels, sample_rate) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(
                    "Stream open failed ({}-bit, {} channels, {}Hz): {}",
                    bit_depth, channels, sample_rate, e
                );
                None
            }
        }
    }

    fn stream_write(&mut self, handle: StreamHandle, data: &[u8]) -> Result<()> {
        self.service_output();
        self.streams
            .get_mut(&handle)
            .ok_or(Error::UnknownStream(handle.0))?
            .write(data)
    }

    fn stream_close(&mut self, handle: StreamHandle) -> Result<()> {
        match self.streams.remove(&handle) {
            Some(stream) => {
                stream.close();
                debug!("Closed {}", handle);
            }
            None => debug!("Close of unknown {} ignored", handle),
        }
        Ok(())
    }
}
