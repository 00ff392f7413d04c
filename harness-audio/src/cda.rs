//! CD-audio music tracks
//!
//! The game addresses its music by CD track number. Tracks live as files
//! named `Track02.ogg`, `Track03.ogg`, ... in the configured music
//! directory. A track is decoded and resampled in full when played, then
//! played once through the engine.

use crate::audio::decoder::TrackDecoder;
use crate::audio::resampler::Resampler;
use crate::engine::{PcmSource, Sound, SoundEngine};
use crate::error::{Error, Result};
use harness_common::units::volume_to_linear;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Track checked by [`CdaPlayer::check_available`]; track 1 is the data track
pub const FIRST_MUSIC_TRACK: i32 = 2;

/// Plays at most one CD-audio track at a time
pub struct CdaPlayer {
    engine: Arc<SoundEngine>,
    music_dir: PathBuf,
    extension: String,
    current: Option<Arc<Sound>>,
    volume: f32,
}

impl CdaPlayer {
    pub fn new(engine: Arc<SoundEngine>, music_dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            engine,
            music_dir: music_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            current: None,
            volume: 1.0,
        }
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    /// File path for a track number, e.g. 3 -> `<music_dir>/Track03.ogg`
    pub fn track_path(&self, track: i32) -> PathBuf {
        self.music_dir
            .join(format!("Track{:02}.{}", track, self.extension))
    }

    /// Confirm music files are installed.
    ///
    /// # Errors
    /// `TrackNotFound` if the first music track is missing.
    pub fn check_available(&self) -> Result<()> {
        let path = self.track_path(FIRST_MUSIC_TRACK);
        if !path.is_file() {
            return Err(Error::TrackNotFound(path));
        }
        info!("CD audio tracks found in {}", self.music_dir.display());
        Ok(())
    }

    /// Stop any current track and play `track` once.
    ///
    /// # Errors
    /// - `TrackNotFound` if the file does not exist
    /// - `Decode` / `ConversionFailed` if it cannot be decoded or resampled
    pub fn play(&mut self, track: i32) -> Result<()> {
        let path = self.track_path(track);
        if !path.is_file() {
            return Err(Error::TrackNotFound(path));
        }

        self.stop();

        let decoded = TrackDecoder::decode_file(&path)?;
        let engine_rate = self.engine.sample_rate();
        let samples = Resampler::resample(
            &decoded.samples,
            decoded.sample_rate,
            engine_rate,
            decoded.channels,
        )?;

        let source = PcmSource::new(samples, decoded.channels, engine_rate);
        let sound = self.engine.create_sound(Arc::new(source));
        sound.set_volume(self.volume);
        sound.start();

        info!(
            "Playing CD audio track {} ({} frames)",
            track,
            sound.length_frames()
        );
        self.current = Some(sound);
        Ok(())
    }

    /// Stop and release the current track. No-op when nothing is loaded.
    pub fn stop(&mut self) {
        if let Some(sound) = self.current.take() {
            sound.stop();
            self.engine.remove_sound(&sound);
            debug!("CD audio sound {} stopped", sound.id());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().map(|s| s.is_playing()).unwrap_or(false)
    }

    /// Set volume on a 0-255 scale. Kept for tracks played later.
    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume_to_linear(volume);
        if let Some(sound) = &self.current {
            sound.set_volume(self.volume);
        }
    }

    /// Current linear volume
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Drop for CdaPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(dir: &Path) -> CdaPlayer {
        let engine = Arc::new(SoundEngine::new(44100, 2).unwrap());
        CdaPlayer::new(engine, dir, ".ogg")
    }

    #[test]
    fn test_track_path_is_zero_padded() {
        let player = player(Path::new("MUSIC"));
        assert_eq!(player.track_path(3), PathBuf::from("MUSIC/Track03.ogg"));
        assert_eq!(player.track_path(12), PathBuf::from("MUSIC/Track12.ogg"));
    }

    #[test]
    fn test_missing_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = player(dir.path());
        assert!(matches!(player.check_available(), Err(Error::TrackNotFound(_))));
        assert!(matches!(player.play(5), Err(Error::TrackNotFound(_))));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_volume_remembered() {
        let mut player = player(Path::new("MUSIC"));
        player.set_volume(0);
        assert_eq!(player.volume(), 0.0);
        player.set_volume(255);
        assert_eq!(player.volume(), 1.0);
    }
}
