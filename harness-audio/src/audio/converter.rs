//! Streaming sample-rate converter
//!
//! Converts PCM chunks from a stream's source rate to the engine mixing rate
//! while keeping resampler state across calls. The output format and channel
//! count equal the input's; only the rate changes.
//!
//! rubato is driven one input frame per call, so every chunk is consumed in
//! full and yields `input_frames × output_rate / input_rate` frames to within
//! one frame. The first few frames of a stream fill the interpolation window
//! and produce no output. Chunks must be fed in arrival order.

use crate::audio::format::SampleFormat;
use crate::audio::resampler::Resampler;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, Resampler as RubatoResampler};
use tracing::{debug, trace};

/// Stateful PCM resampler for one stream
pub struct Converter {
    format: SampleFormat,
    channels: u16,
    input_rate: u32,
    output_rate: u32,
    resampler: FastFixedIn<f32>,
    /// One planar input frame
    frame_in: Vec<Vec<f32>>,
    /// Planar resampler output for one input frame
    frame_out: Vec<Vec<f32>>,
    /// Interleaved scratch for decoding one call's input
    decoded: Vec<f32>,
    /// Interleaved output of one call, encoded only once the call succeeds
    converted: Vec<f32>,
}

impl Converter {
    /// Create a converter for `(format, channels)` from `input_rate` to `output_rate`.
    ///
    /// # Errors
    /// `BackendInitFailed` if the resampler rejects the configuration.
    pub fn new(
        format: SampleFormat,
        channels: u16,
        input_rate: u32,
        output_rate: u32,
    ) -> Result<Self> {
        if channels == 0 || input_rate == 0 || output_rate == 0 {
            return Err(Error::BackendInitFailed(format!(
                "invalid converter config: {} channels, {}Hz -> {}Hz",
                channels, input_rate, output_rate
            )));
        }

        let resampler = Resampler::create_resampler(input_rate, output_rate, channels, 1)?;
        let frame_out = resampler.output_buffer_allocate(true);

        debug!(
            "Created {:?} converter: {} channels, {}Hz -> {}Hz",
            format, channels, input_rate, output_rate
        );

        Ok(Self {
            format,
            channels,
            input_rate,
            output_rate,
            resampler,
            frame_in: vec![vec![0.0; 1]; channels as usize],
            frame_out,
            decoded: Vec::new(),
            converted: Vec::new(),
        })
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Nominal output length for `input_frames` (truncating).
    pub fn expected_output_frames(&self, input_frames: usize) -> usize {
        (input_frames as u64 * self.output_rate as u64 / self.input_rate as u64) as usize
    }

    /// Convert one chunk of interleaved PCM bytes.
    ///
    /// Appends converted bytes (same format and channel count) to `output`.
    /// A trailing partial frame in `input` is ignored. No input is held back
    /// for later calls.
    ///
    /// # Returns
    /// Number of output frames appended
    ///
    /// # Errors
    /// `ConversionFailed` if rubato fails. Nothing is appended to `output`
    /// and the failed chunk is dropped.
    pub fn process(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let channels = self.channels as usize;

        self.decoded.clear();
        self.format.decode_into(input, &mut self.decoded);
        self.converted.clear();

        for frame in self.decoded.chunks_exact(channels) {
            for (channel, sample) in self.frame_in.iter_mut().zip(frame) {
                channel[0] = *sample;
            }

            let (_, produced) = self
                .resampler
                .process_into_buffer(&self.frame_in, &mut self.frame_out, None)
                .map_err(|e| Error::ConversionFailed(e.to_string()))?;

            for index in 0..produced {
                self.converted
                    .extend(self.frame_out.iter().map(|channel| channel[index]));
            }
        }

        let consumed = self.decoded.len() / channels;
        let produced = self.converted.len() / channels;
        self.format.encode_into(&self.converted, output);

        trace!("Converter consumed {} frames, produced {}", consumed, produced);

        Ok(produced)
    }
}
