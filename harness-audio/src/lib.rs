//! # Harness Audio Library (harness-audio)
//!
//! Audio side of the game harness: streaming PCM (video audio), one-shot
//! samples and CD-audio music behind one [`AudioBackend`] contract.
//!
//! **Architecture:** paged stream buffers and a flat sound engine, with
//! symphonia + rubato + cpal underneath
//!
//! ```text
//! producer --StreamWrite--> [Converter] --> PagedBuffer --> Sound --\
//! samples (u8 PCM) ----------------------------------------> Sound ---> SoundEngine --> cpal
//! CD track --symphonia--> rubato ---------------------------> Sound --/
//! ```

pub mod audio;
pub mod backend;
pub mod cda;
pub mod engine;
pub mod error;
pub mod sample;
pub mod stream;

pub use backend::{create_backend, AudioBackend, MixerBackend, NullBackend, SampleHandle, StreamHandle};
pub use engine::SoundEngine;
pub use error::{Error, Result};
pub use stream::{AudioStream, StreamSpec};
