//! Streaming audio buffer adapter
//!
//! Turns irregular pushes of raw PCM (typically one video frame's worth of
//! decoded audio per call) into a continuously playable engine sound.
//!
//! Each stream owns a [`PagedBuffer`] holding audio at the engine mixing
//! rate. When the producer's rate differs, every chunk passes through a
//! stateful [`Converter`] first. The stream's [`Sound`] plays the buffer;
//! whenever it has run dry and stopped, the next write seeks it to the frame
//! count that existed before that write (or to where the sound stopped, if
//! that is earlier) and starts it again, so playback neither replays old
//! audio nor skips the new chunk.
//!
//! Running dry (starvation) is expected when the producer falls behind. It
//! is counted and logged, never treated as an error.

use crate::audio::converter::Converter;
use crate::audio::format::SampleFormat;
use crate::audio::paged_buffer::{Page, PagedBuffer};
use crate::engine::{DataSource, Sound, SoundEngine};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Lowest accepted producer sample rate
pub const MIN_STREAM_RATE: u32 = 8000;

/// Highest accepted producer sample rate
pub const MAX_STREAM_RATE: u32 = 192_000;

/// Most interleaved channels a stream may carry
pub const MAX_STREAM_CHANNELS: u16 = 8;

/// Immutable stream configuration captured at open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
}

impl StreamSpec {
    /// Validate harness open parameters.
    ///
    /// # Errors
    /// `InvalidFormat` for a bit depth other than 8/16/24/32, a channel count
    /// outside 1..=8, or a rate outside 8000..=192000 Hz.
    pub fn new(bit_depth: i32, channels: i32, sample_rate: u32) -> Result<Self> {
        let format = SampleFormat::from_bit_depth(bit_depth)
            .ok_or_else(|| Error::InvalidFormat(format!("unsupported bit depth {}", bit_depth)))?;

        if channels < 1 || channels > MAX_STREAM_CHANNELS as i32 {
            return Err(Error::InvalidFormat(format!(
                "channel count {} outside 1..={}",
                channels, MAX_STREAM_CHANNELS
            )));
        }

        if !(MIN_STREAM_RATE..=MAX_STREAM_RATE).contains(&sample_rate) {
            return Err(Error::InvalidFormat(format!(
                "sample rate {}Hz outside {}..={}Hz",
                sample_rate, MIN_STREAM_RATE, MAX_STREAM_RATE
            )));
        }

        Ok(Self {
            format,
            channels: channels as u16,
            sample_rate,
        })
    }

    /// Bytes per interleaved frame
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.format.bytes_per_sample()
    }

    pub fn needs_conversion(&self, engine_rate: u32) -> bool {
        self.sample_rate != engine_rate
    }
}

/// One open harness stream
pub struct AudioStream {
    spec: StreamSpec,
    buffer: Arc<PagedBuffer>,
    converter: Option<Converter>,
    sound: Arc<Sound>,
    engine: Arc<SoundEngine>,
    starvation_count: u64,
}

impl AudioStream {
    /// Open a stream feeding `engine`.
    ///
    /// The converter (if any) is built before the sound is registered, so a
    /// failed open leaves nothing attached to the engine.
    ///
    /// # Errors
    /// - `InvalidFormat` for bad parameters (see [`StreamSpec::new`])
    /// - `BackendInitFailed` if the converter cannot be created
    pub fn open(
        engine: Arc<SoundEngine>,
        bit_depth: i32,
        channels: i32,
        sample_rate: u32,
    ) -> Result<Self> {
        let spec = StreamSpec::new(bit_depth, channels, sample_rate)?;
        let engine_rate = engine.sample_rate();

        let converter = if spec.needs_conversion(engine_rate) {
            Some(Converter::new(spec.format, spec.channels, spec.sample_rate, engine_rate)?)
        } else {
            None
        };

        let buffer = Arc::new(PagedBuffer::new(spec.format, spec.channels, engine_rate));
        let sound = engine.create_sound(Arc::clone(&buffer) as Arc<dyn DataSource>);

        debug!(
            "Opened stream: {}-bit, {} channels, {}Hz{}",
            spec.format.bit_depth(),
            spec.channels,
            spec.sample_rate,
            if converter.is_some() {
                format!(" (converting to {}Hz)", engine_rate)
            } else {
                String::new()
            }
        );

        Ok(Self {
            spec,
            buffer,
            converter,
            sound,
            engine,
            starvation_count: 0,
        })
    }

    /// Append one chunk of interleaved PCM.
    ///
    /// A trailing partial frame is ignored; a chunk shorter than one frame is
    /// a no-op.
    ///
    /// # Errors
    /// `ConversionFailed` if the resampler fails. Nothing is appended for this
    /// chunk; audio buffered by earlier writes stays playable.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let frame_size = self.spec.frame_size();
        let frames_in = data.len() / frame_size;
        if frames_in == 0 {
            return Ok(());
        }

        let current_pos = self.buffer.frame_count();
        let starved = self.sound.at_end();

        match self.converter.as_mut() {
            Some(converter) => {
                let frames_out = converter.expected_output_frames(frames_in);
                let mut converted = Vec::with_capacity((frames_out + 2) * frame_size);
                let produced = converter.process(&data[..frames_in * frame_size], &mut converted)?;
                if produced > 0 {
                    self.buffer.append(Page::new(converted, frame_size));
                }
                trace!("Stream chunk: {} frames in, {} frames out", frames_in, produced);
            }
            None => {
                self.buffer.append(Page::from_slice(data, frame_size));
            }
        }

        // A sound that ran dry while the previous chunk was being appended
        // stopped short of `current_pos`; resume where it actually stopped.
        let resume_at = if starved {
            current_pos.min(self.sound.cursor_frame())
        } else {
            current_pos
        };

        if !self.sound.is_playing() && self.buffer.frame_count() > resume_at {
            match self.sound.seek_to_frame(resume_at) {
                Ok(()) => {
                    self.sound.start();
                    debug!("Stream sound {} started at frame {}", self.sound.id(), resume_at);
                }
                Err(e) => warn!("Failed to resume stream sound {}: {}", self.sound.id(), e),
            }
        }

        if starved {
            self.starvation_count += 1;
            warn!(
                "Stream sound {} starved at frame {}: producer is not keeping up",
                self.sound.id(),
                current_pos
            );
        }

        Ok(())
    }

    /// Stop playback and release the buffer, converter and sound.
    pub fn close(self) {
        debug!(
            "Closing stream sound {} after {} frames ({} starvations)",
            self.sound.id(),
            self.buffer.frame_count(),
            self.starvation_count
        );
    }

    pub fn spec(&self) -> &StreamSpec {
        &self.spec
    }

    /// Frames buffered so far, at the engine rate
    pub fn buffered_frames(&self) -> u64 {
        self.buffer.frame_count()
    }

    pub fn buffer(&self) -> &Arc<PagedBuffer> {
        &self.buffer
    }

    pub fn sound(&self) -> &Arc<Sound> {
        &self.sound
    }

    pub fn is_playing(&self) -> bool {
        self.sound.is_playing()
    }

    pub fn is_converting(&self) -> bool {
        self.converter.is_some()
    }

    /// Writes that found the sound had already played everything buffered
    pub fn starvation_count(&self) -> u64 {
        self.starvation_count
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        self.sound.stop();
        self.engine.remove_sound(&self.sound);
    }
}
