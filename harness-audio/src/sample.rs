//! One-shot sample voices
//!
//! A voice plays one caller-supplied block of 8-bit unsigned PCM at a time.
//! Volume, pan and frequency set while the voice is idle are remembered and
//! applied by the next `play` (only when the remembered volume is above 0).

use crate::audio::format::SampleFormat;
use crate::engine::{PcmSource, Sound, SoundEngine};
use crate::error::{Error, Result};
use harness_common::units::{pan_to_balance, pitch_from_rates, volume_to_linear};
use std::sync::Arc;
use tracing::debug;

/// State behind one allocated sample handle
#[derive(Default)]
pub struct SampleVoice {
    sound: Option<Arc<Sound>>,
    init_volume: i32,
    init_pan: i32,
    init_new_rate: i32,
}

impl SampleVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play `data` (8-bit unsigned, interleaved) at `rate` Hz.
    ///
    /// Any sound this voice was already playing is replaced.
    ///
    /// # Errors
    /// `InvalidFormat` for zero channels, a non-positive rate, or data
    /// shorter than one frame.
    pub fn play(
        &mut self,
        engine: &SoundEngine,
        channels: i32,
        data: &[u8],
        rate: i32,
        looping: bool,
    ) -> Result<()> {
        if channels < 1 || rate <= 0 {
            return Err(Error::InvalidFormat(format!(
                "sample with {} channels at {}Hz",
                channels, rate
            )));
        }
        if data.len() < channels as usize {
            return Err(Error::InvalidFormat("sample data shorter than one frame".to_string()));
        }

        self.stop(engine);

        let mut samples = Vec::with_capacity(data.len());
        SampleFormat::U8.decode_into(data, &mut samples);
        let source = PcmSource::new(samples, channels as u16, rate as u32);
        let sound = engine.create_sound(Arc::new(source));
        self.sound = Some(Arc::clone(&sound));

        if self.init_volume > 0 {
            self.set_volume(self.init_volume);
            self.set_pan(self.init_pan);
            self.set_frequency(rate, self.init_new_rate);
        }

        sound.set_looping(looping);
        sound.start();
        debug!(
            "Sample sound {} playing: {} bytes, {} channels, {}Hz, loop={}",
            sound.id(),
            data.len(),
            channels,
            rate,
            looping
        );
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.sound.as_ref().map(|s| s.is_playing()).unwrap_or(false)
    }

    /// Set volume on a 0-255 scale, or remember it for the next `play`.
    pub fn set_volume(&mut self, volume: i32) {
        match &self.sound {
            Some(sound) => sound.set_volume(volume_to_linear(volume)),
            None => self.init_volume = volume,
        }
    }

    /// Set pan on a -10000..=10000 scale, or remember it for the next `play`.
    pub fn set_pan(&mut self, pan: i32) {
        match &self.sound {
            Some(sound) => sound.set_pan(pan_to_balance(pan)),
            None => self.init_pan = pan,
        }
    }

    /// Set playback frequency, or remember `new_rate` for the next `play`.
    pub fn set_frequency(&mut self, original_rate: i32, new_rate: i32) {
        match &self.sound {
            Some(sound) => sound.set_pitch(pitch_from_rates(original_rate, new_rate)),
            None => self.init_new_rate = new_rate,
        }
    }

    /// Stop and release the sound. No-op when idle.
    pub fn stop(&mut self, engine: &SoundEngine) {
        if let Some(sound) = self.sound.take() {
            sound.stop();
            engine.remove_sound(&sound);
            debug!("Sample sound {} stopped", sound.id());
        }
    }

    pub fn sound(&self) -> Option<&Arc<Sound>> {
        self.sound.as_ref()
    }
}
