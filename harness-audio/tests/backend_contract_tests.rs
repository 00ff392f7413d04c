//! Backend contract tests
//!
//! Every variant must accept the same calls. The mixer variant must also
//! apply the harness unit conversions to the sounds it plays.

mod helpers;

use harness_audio::{create_backend, AudioBackend, Error, MixerBackend, NullBackend, SampleHandle};
use harness_common::{AudioConfig, BackendKind};
use helpers::{detached_backend, pull_frames, TEST_ENGINE_RATE};
use std::path::Path;

fn mixer() -> MixerBackend {
    detached_backend(Path::new("MUSIC"), "ogg")
}

/// The sample call sequence the game issues for one sound effect
fn exercise_samples(backend: &mut dyn AudioBackend) -> SampleHandle {
    let handle = backend.allocate_sample();
    backend.set_volume(handle, 200).unwrap();
    backend.set_pan(handle, -2500).unwrap();
    backend.set_frequency(handle, 11025, 22050).unwrap();
    backend
        .play_sample(handle, 1, &[200u8; 512], 11025, false)
        .unwrap();
    backend.set_volume(handle, 100).unwrap();
    backend.stop_sample(handle).unwrap();
    assert!(!backend.sound_is_playing(handle));
    handle
}

#[test]
fn test_null_backend_accepts_everything() {
    let mut backend = NullBackend::new();
    assert_eq!(backend.name(), "null");

    backend.init_cda().unwrap();
    backend.play_cda(3).unwrap();
    assert!(!backend.cda_is_playing());
    backend.set_cda_volume(128).unwrap();
    backend.stop_cda().unwrap();
    backend.uninit_cda().unwrap();

    let handle = exercise_samples(&mut backend);
    backend.release_sample(handle).unwrap();
    backend.shutdown();
}

#[test]
fn test_mixer_backend_runs_same_sequence() {
    let mut backend = mixer();
    assert_eq!(backend.name(), "mixer");

    let handle = exercise_samples(&mut backend);
    backend.release_sample(handle).unwrap();
    assert_eq!(backend.engine().sound_count(), 0);
    backend.uninit_cda().unwrap();
    backend.shutdown();
}

#[test]
fn test_create_backend_selects_variant() {
    let null = AudioConfig {
        backend: BackendKind::Null,
        ..AudioConfig::default()
    };
    assert_eq!(create_backend(&null).unwrap().name(), "null");

    let mixer = AudioConfig {
        device: "none".to_string(),
        ..AudioConfig::default()
    };
    assert_eq!(create_backend(&mixer).unwrap().name(), "mixer");
}

#[test]
fn test_volume_conversion() {
    let mut backend = mixer();
    let handle = backend.allocate_sample();
    backend
        .play_sample(handle, 1, &[128u8; 64], TEST_ENGINE_RATE as i32, true)
        .unwrap();

    for (volume, expected) in [(255, 1.0f32), (0, 0.0), (128, 128.0 / 255.0)] {
        backend.set_volume(handle, volume).unwrap();
        let sound = backend.sample(handle).unwrap().sound().unwrap();
        assert!((sound.volume() - expected).abs() < 1e-6, "volume {}", volume);
    }
    let sound = backend.sample(handle).unwrap().sound().unwrap();
    assert!((sound.volume() - 0.502).abs() < 1e-3);
}

#[test]
fn test_pan_conversion() {
    let mut backend = mixer();
    let handle = backend.allocate_sample();
    backend
        .play_sample(handle, 1, &[128u8; 64], TEST_ENGINE_RATE as i32, true)
        .unwrap();

    for (pan, expected) in [(0, 0.0f32), (10000, 1.0), (-10000, -1.0), (5000, 0.5)] {
        backend.set_pan(handle, pan).unwrap();
        let sound = backend.sample(handle).unwrap().sound().unwrap();
        assert_eq!(sound.pan(), expected, "pan {}", pan);
    }
}

#[test]
fn test_full_right_pan_is_audible_right_only() {
    let mut backend = mixer();
    let handle = backend.allocate_sample();
    backend
        .play_sample(handle, 1, &[255u8; 64], TEST_ENGINE_RATE as i32, false)
        .unwrap();
    backend.set_pan(handle, 10000).unwrap();

    let out = pull_frames(&backend, 16);
    let expected = (255.0 - 128.0) / 128.0;
    for frame in out.chunks(2) {
        assert_eq!(frame[0], 0.0);
        assert!((frame[1] - expected).abs() < 1e-6);
    }
}

#[test]
fn test_frequency_conversion() {
    let mut backend = mixer();
    let handle = backend.allocate_sample();
    backend
        .play_sample(handle, 1, &[128u8; 4096], 11025, false)
        .unwrap();
    backend.set_frequency(handle, 11025, 22050).unwrap();

    let sound = backend.sample(handle).unwrap().sound().unwrap();
    assert_eq!(sound.pitch(), 2.0);

    // 11025Hz at double pitch on a 44100Hz engine advances half a source frame per output frame
    pull_frames(&backend, 100);
    let sound = backend.sample(handle).unwrap().sound().unwrap();
    assert_eq!(sound.cursor_frame(), 50);
}

#[test]
fn test_one_shot_sample_finishes() {
    let mut backend = mixer();
    let handle = backend.allocate_sample();
    backend
        .play_sample(handle, 2, &[200u8; 64], TEST_ENGINE_RATE as i32, false)
        .unwrap();
    assert!(backend.sound_is_playing(handle));

    pull_frames(&backend, 64);
    assert!(!backend.sound_is_playing(handle));
}

#[test]
fn test_unknown_sample_handle() {
    let mut backend = mixer();
    let handle = SampleHandle(4242);
    assert!(matches!(
        backend.play_sample(handle, 1, &[128u8; 8], 22050, false),
        Err(Error::UnknownSample(4242))
    ));
    assert!(!backend.sound_is_playing(handle));
}
