//! Playable sound handle
//!
//! A `Sound` pairs a [`DataSource`] with playback state. The harness thread
//! starts, stops, seeks and adjusts it; the mixer advances its cursor on the
//! audio thread. Flags are atomics; cursor and gain parameters sit behind a
//! short-lived lock taken once per mix callback.

use super::DataSource;
use crate::error::{Error, Result};
use harness_common::units::balance_gains;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct SoundParams {
    /// Read position in source frames (fractional when resampling)
    cursor: f64,
    volume: f32,
    pan: f32,
    pitch: f32,
    looping: bool,
}

/// A data source registered with the engine plus its playback state
pub struct Sound {
    id: u64,
    source: Arc<dyn DataSource>,
    playing: AtomicBool,
    at_end: AtomicBool,
    params: Mutex<SoundParams>,
}

impl Sound {
    pub(crate) fn new(id: u64, source: Arc<dyn DataSource>) -> Self {
        Self {
            id,
            source,
            playing: AtomicBool::new(false),
            at_end: AtomicBool::new(false),
            params: Mutex::new(SoundParams {
                cursor: 0.0,
                volume: 1.0,
                pan: 0.0,
                pitch: 1.0,
                looping: false,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn length_frames(&self) -> u64 {
        self.source.length_frames()
    }

    pub fn start(&self) {
        self.playing.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.playing.store(false, Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// True once a non-looping sound has played up to the end of its data.
    ///
    /// Cleared by seeking.
    pub fn at_end(&self) -> bool {
        self.at_end.load(Ordering::Acquire)
    }

    /// Move the read cursor.
    ///
    /// # Errors
    /// `InvalidState` if `frame` is past the data currently available.
    pub fn seek_to_frame(&self, frame: u64) -> Result<()> {
        let length = self.source.length_frames();
        if frame > length {
            return Err(Error::InvalidState(format!(
                "seek to frame {} past end of sound {} ({} frames)",
                frame, self.id, length
            )));
        }

        self.params.lock().cursor = frame as f64;
        self.at_end.store(false, Ordering::Release);
        Ok(())
    }

    /// Current read position in whole source frames
    pub fn cursor_frame(&self) -> u64 {
        self.params.lock().cursor as u64
    }

    /// Set linear volume (clamped to 0.0 or above)
    pub fn set_volume(&self, volume: f32) {
        self.params.lock().volume = volume.max(0.0);
    }

    pub fn volume(&self) -> f32 {
        self.params.lock().volume
    }

    /// Set balance, -1.0 (left) to 1.0 (right)
    pub fn set_pan(&self, pan: f32) {
        self.params.lock().pan = pan.clamp(-1.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.params.lock().pan
    }

    /// Set pitch as a playback speed ratio. Non-positive values are ignored.
    pub fn set_pitch(&self, pitch: f32) {
        if pitch > 0.0 && pitch.is_finite() {
            self.params.lock().pitch = pitch;
        }
    }

    pub fn pitch(&self) -> f32 {
        self.params.lock().pitch
    }

    pub fn set_looping(&self, looping: bool) {
        self.params.lock().looping = looping;
    }

    /// Add this sound's next `out.len() / out_channels` frames into `out`.
    ///
    /// Runs on the audio thread. Resamples by linear interpolation when the
    /// source rate or pitch differs from the engine rate. A non-looping sound
    /// that runs out of data stops and raises `at_end`; frames it could not
    /// fill are left untouched (silence).
    pub(crate) fn mix_into(
        &self,
        out: &mut [f32],
        out_channels: usize,
        engine_rate: u32,
        scratch: &mut Vec<f32>,
    ) {
        if !self.is_playing() || out_channels == 0 {
            return;
        }

        let mut params = self.params.lock();
        let src_channels = self.source.channels().max(1) as usize;
        let step = params.pitch as f64 * self.source.sample_rate() as f64 / engine_rate as f64;
        let (left_gain, right_gain) = balance_gains(params.pan);
        let volume = params.volume;
        let frames = out.len() / out_channels;
        let mut produced = 0usize;

        while produced < frames {
            let length = self.source.length_frames();
            if params.cursor >= length as f64 {
                if params.looping && length > 0 {
                    params.cursor %= length as f64;
                    continue;
                }
                break;
            }

            let base = params.cursor.floor() as u64;
            let wanted = ((frames - produced) as f64 * step).ceil() as usize + 2;
            let wanted = wanted.min((length - base) as usize);
            scratch.resize(wanted * src_channels, 0.0);
            let read = self.source.read_frames(base, &mut scratch[..]);
            if read == 0 {
                break;
            }

            let mut cursor = params.cursor;
            while produced < frames {
                let rel = cursor - base as f64;
                let i0 = rel as usize;
                if i0 >= read {
                    break;
                }
                let i1 = (i0 + 1).min(read - 1);
                let frac = (rel - i0 as f64) as f32;

                let frame_out = &mut out[produced * out_channels..(produced + 1) * out_channels];
                for (ch, dst) in frame_out.iter_mut().enumerate() {
                    let src_ch = if src_channels == 1 {
                        0
                    } else if ch < src_channels {
                        ch
                    } else {
                        continue;
                    };

                    let s0 = scratch[i0 * src_channels + src_ch];
                    let s1 = scratch[i1 * src_channels + src_ch];
                    let mut value = (s0 + (s1 - s0) * frac) * volume;
                    if out_channels >= 2 {
                        if ch == 0 {
                            value *= left_gain;
                        } else if ch == 1 {
                            value *= right_gain;
                        }
                    }
                    *dst += value;
                }

                cursor += step;
                produced += 1;
            }
            params.cursor = cursor;
        }

        if !params.looping && params.cursor >= self.source.length_frames() as f64 {
            self.at_end.store(true, Ordering::Release);
            self.playing.store(false, Ordering::Release);
        }
    }
}
