//! In-process sound engine
//!
//! Owns the set of registered sounds and mixes the playing ones into an
//! interleaved f32 buffer on demand. The cpal output callback pulls from
//! [`SoundEngine::read_pcm_frames`]; with no device attached the caller pulls
//! frames itself (tests, detached mode).

mod sound;
mod source;

pub use sound::Sound;
pub use source::{DataSource, PcmSource};

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Flat mixer over all registered sounds
pub struct SoundEngine {
    sample_rate: u32,
    channels: u16,
    master_volume: Mutex<f32>,
    sounds: Mutex<Vec<Arc<Sound>>>,
    scratch: Mutex<Vec<f32>>,
    next_id: AtomicU64,
}

impl SoundEngine {
    /// Create an engine mixing at `sample_rate` with `channels` outputs.
    ///
    /// # Errors
    /// `BackendInitFailed` if either value is zero.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(Error::BackendInitFailed(format!(
                "invalid engine config: {}Hz, {} channels",
                sample_rate, channels
            )));
        }

        debug!("Sound engine: {}Hz, {} channels", sample_rate, channels);

        Ok(Self {
            sample_rate,
            channels,
            master_volume: Mutex::new(1.0),
            sounds: Mutex::new(Vec::new()),
            scratch: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Mixing rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Register a sound for `source`. The sound starts stopped.
    pub fn create_sound(&self, source: Arc<dyn DataSource>) -> Arc<Sound> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sound = Arc::new(Sound::new(id, source));
        self.sounds.lock().push(Arc::clone(&sound));
        debug!("Registered sound {}", id);
        sound
    }

    /// Detach a sound from the mixer. Unknown sounds are ignored.
    pub fn remove_sound(&self, sound: &Sound) {
        let mut sounds = self.sounds.lock();
        let before = sounds.len();
        sounds.retain(|s| s.id() != sound.id());
        if sounds.len() != before {
            debug!("Removed sound {}", sound.id());
        }
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.lock().len()
    }

    /// Set the gain applied after summing (clamped to 0.0..=1.0)
    pub fn set_master_volume(&self, volume: f32) {
        *self.master_volume.lock() = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        *self.master_volume.lock()
    }

    /// Mix the next block of audio into `out` (interleaved, `channels()` wide).
    ///
    /// `out` is overwritten; silence where nothing plays. Output is clamped
    /// to [-1.0, 1.0].
    ///
    /// # Returns
    /// Number of frames written (`out.len() / channels()`)
    pub fn read_pcm_frames(&self, out: &mut [f32]) -> usize {
        let channels = self.channels as usize;
        let frames = out.len() / channels;
        let out = &mut out[..frames * channels];
        out.fill(0.0);

        {
            let sounds = self.sounds.lock();
            let mut scratch = self.scratch.lock();
            for sound in sounds.iter() {
                sound.mix_into(out, channels, self.sample_rate, &mut scratch);
            }
        }

        let master = self.master_volume();
        for sample in out.iter_mut() {
            *sample = (*sample * master).clamp(-1.0, 1.0);
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SoundEngine {
        SoundEngine::new(44100, 2).unwrap()
    }

    #[test]
    fn test_rejects_zero_config() {
        assert!(SoundEngine::new(0, 2).is_err());
        assert!(SoundEngine::new(44100, 0).is_err());
    }

    #[test]
    fn test_silence_without_sounds() {
        let engine = engine();
        let mut out = vec![1.0; 64];
        assert_eq!(engine.read_pcm_frames(&mut out), 32);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_sums_and_clamps() {
        let engine = engine();
        for _ in 0..3 {
            let sound = engine.create_sound(Arc::new(PcmSource::new(vec![0.5; 16], 2, 44100)));
            sound.start();
        }

        let mut out = vec![0.0; 8];
        engine.read_pcm_frames(&mut out);
        assert!(out.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn test_master_volume() {
        let engine = engine();
        engine.set_master_volume(0.5);
        let sound = engine.create_sound(Arc::new(PcmSource::new(vec![0.5; 8], 2, 44100)));
        sound.start();

        let mut out = vec![0.0; 8];
        engine.read_pcm_frames(&mut out);
        assert!(out.iter().all(|s| (*s - 0.25).abs() < 1e-6));

        engine.set_master_volume(7.0);
        assert_eq!(engine.master_volume(), 1.0);
    }

    #[test]
    fn test_remove_sound() {
        let engine = engine();
        let sound = engine.create_sound(Arc::new(PcmSource::new(vec![0.5; 8], 2, 44100)));
        sound.start();
        assert_eq!(engine.sound_count(), 1);

        engine.remove_sound(&sound);
        engine.remove_sound(&sound);
        assert_eq!(engine.sound_count(), 0);

        let mut out = vec![0.0; 8];
        engine.read_pcm_frames(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
