//! Audio fixture generation
//!
//! WAV files for CD-audio tests and deterministic PCM byte chunks for stream
//! tests, plus a device-free backend whose engine the test pulls by hand.

use harness_audio::MixerBackend;
use harness_common::AudioConfig;
use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Mixing rate of [`detached_backend`]
pub const TEST_ENGINE_RATE: u32 = 44100;

/// Mixer backend with no output device
pub fn detached_backend(music_dir: &Path, extension: &str) -> MixerBackend {
    let config = AudioConfig {
        device: "none".to_string(),
        sample_rate: TEST_ENGINE_RATE,
        channels: 2,
        music_dir: music_dir.to_path_buf(),
        music_extension: extension.to_string(),
        ..AudioConfig::default()
    };
    MixerBackend::new(&config).expect("detached backend")
}

/// Pull `frames` frames from the backend's engine, as the device would.
pub fn pull_frames(backend: &MixerBackend, frames: usize) -> Vec<f32> {
    let channels = backend.engine().channels() as usize;
    let mut out = vec![0.0; frames * channels];
    backend.engine().read_pcm_frames(&mut out);
    out
}

/// Generate a sine wave WAV file (16-bit).
///
/// # Arguments
/// * `path` - Output file path
/// * `sample_rate` - File sample rate
/// * `channels` - Channel count (same signal on every channel)
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Sine frequency
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
    frequency_hz: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (sample_rate as u64 * duration_ms) / 1000;

    for i in 0..total_frames {
        let t = i as f32 / sample_rate as f32;
        let value = ((2.0 * PI * frequency_hz * t).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Raw PCM bytes of `frames` frames where every byte differs from its
/// neighbour, so byte-identity checks catch misplaced frames.
pub fn pcm_chunk(frames: usize, frame_size: usize, seed: u8) -> Vec<u8> {
    (0..frames * frame_size)
        .map(|i| seed.wrapping_add((i % 251) as u8))
        .collect()
}

/// 16-bit stereo ramp starting at `start`, one step per frame
pub fn s16_ramp(frames: usize, start: i16) -> Vec<u8> {
    (0..frames)
        .flat_map(|i| {
            let v = start.wrapping_add(i as i16).to_le_bytes();
            [v[0], v[1], v[0], v[1]]
        })
        .collect()
}
