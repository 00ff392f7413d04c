//! PCM plumbing: sample formats, paged storage, rate conversion, decoding
//! and device output

pub mod converter;
pub mod decoder;
pub mod format;
pub mod output;
pub mod paged_buffer;
pub mod resampler;

pub use converter::Converter;
pub use decoder::{DecodedAudio, TrackDecoder};
pub use format::SampleFormat;
pub use output::AudioOutput;
pub use paged_buffer::{Page, PagedBuffer};
pub use resampler::Resampler;
