//! Data sources that a [`Sound`](super::Sound) can play

/// Random-access PCM source read by the mixer.
///
/// Implementations are shared between the harness thread and the audio
/// callback, so reads take `&self`. The length may grow over time (streams)
/// but never shrinks.
pub trait DataSource: Send + Sync {
    /// Interleaved channels per frame
    fn channels(&self) -> u16;

    /// Frame rate of the stored data
    fn sample_rate(&self) -> u32;

    /// Frames currently available
    fn length_frames(&self) -> u64;

    /// Decode frames starting at `start_frame` into interleaved f32.
    ///
    /// Reads at most `out.len() / channels()` frames and returns how many were
    /// read.
    fn read_frames(&self, start_frame: u64, out: &mut [f32]) -> usize;
}

/// Fixed, fully decoded PCM held in memory (one-shot samples, music tracks)
#[derive(Debug, Clone)]
pub struct PcmSource {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl PcmSource {
    /// Wrap interleaved f32 samples. A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let frames = samples.len() / channels as usize;
        samples.truncate(frames * channels as usize);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }
}

impl DataSource for PcmSource {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn length_frames(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    fn read_frames(&self, start_frame: u64, out: &mut [f32]) -> usize {
        let channels = self.channels as usize;
        let length = self.length_frames();
        if start_frame >= length {
            return 0;
        }

        let frames = ((length - start_frame) as usize).min(out.len() / channels);
        let start = start_frame as usize * channels;
        out[..frames * channels].copy_from_slice(&self.samples[start..start + frames * channels]);
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_source_reads() {
        let source = PcmSource::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7], 2, 22050);
        assert_eq!(source.length_frames(), 3);

        let mut out = [0.0; 4];
        assert_eq!(source.read_frames(1, &mut out), 2);
        assert_eq!(out, [0.3, 0.4, 0.5, 0.6]);
        assert_eq!(source.read_frames(3, &mut out), 0);
    }
}
