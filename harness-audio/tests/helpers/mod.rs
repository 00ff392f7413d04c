//! Test helper modules for harness-audio integration tests
//!
//! - audio_generator: WAV fixtures (CD-audio tracks) and raw PCM chunks

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{
    detached_backend, generate_sine_wav, pcm_chunk, pull_frames, s16_ramp, TEST_ENGINE_RATE,
};
