//! PCM sample formats
//!
//! Harness PCM is always little-endian integer data:
//!
//! | Bit depth | Format | Bytes | Zero level |
//! |---|---|---|---|
//! | 8 | `U8` (unsigned) | 1 | 128 |
//! | 16 | `S16` | 2 | 0 |
//! | 24 | `S24` (packed) | 3 | 0 |
//! | 32 | `S32` | 4 | 0 |
//!
//! The converter and mixer work in f32 (-1.0 to 1.0); these helpers move
//! between the two representations.

const S16_SCALE: f32 = 32768.0;
const S24_SCALE: f32 = 8_388_608.0;
const S32_SCALE: f64 = 2_147_483_648.0;
const U8_SCALE: f32 = 128.0;

/// Integer PCM sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    U8,
    S16,
    S24,
    S32,
}

impl SampleFormat {
    /// Map a harness bit depth to a sample format.
    ///
    /// Returns None for anything other than 8, 16, 24 or 32.
    pub fn from_bit_depth(bit_depth: i32) -> Option<Self> {
        match bit_depth {
            8 => Some(SampleFormat::U8),
            16 => Some(SampleFormat::S16),
            24 => Some(SampleFormat::S24),
            32 => Some(SampleFormat::S32),
            _ => None,
        }
    }

    pub fn bit_depth(self) -> u32 {
        self.bytes_per_sample() as u32 * 8
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 => 4,
        }
    }

    /// Decode one sample. `bytes` must hold exactly `bytes_per_sample()` bytes.
    pub fn decode_sample(self, bytes: &[u8]) -> f32 {
        match self {
            SampleFormat::U8 => (bytes[0] as f32 - U8_SCALE) / U8_SCALE,
            SampleFormat::S16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / S16_SCALE,
            SampleFormat::S24 => {
                // Sign-extend the top byte
                let sign = if bytes[2] & 0x80 != 0 { 0xFF } else { 0x00 };
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], sign]) as f32 / S24_SCALE
            }
            SampleFormat::S32 => {
                (i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64 / S32_SCALE)
                    as f32
            }
        }
    }

    /// Encode one sample into `out` (exactly `bytes_per_sample()` bytes).
    ///
    /// Values are clamped to the format's range.
    pub fn encode_sample(self, value: f32, out: &mut [u8]) {
        match self {
            SampleFormat::U8 => {
                out[0] = (value * U8_SCALE + U8_SCALE).round().clamp(0.0, 255.0) as u8;
            }
            SampleFormat::S16 => {
                let v = (value * S16_SCALE).round().clamp(-S16_SCALE, S16_SCALE - 1.0) as i16;
                out.copy_from_slice(&v.to_le_bytes());
            }
            SampleFormat::S24 => {
                let v = (value * S24_SCALE).round().clamp(-S24_SCALE, S24_SCALE - 1.0) as i32;
                out.copy_from_slice(&v.to_le_bytes()[..3]);
            }
            SampleFormat::S32 => {
                let v = (value as f64 * S32_SCALE)
                    .round()
                    .clamp(i32::MIN as f64, i32::MAX as f64) as i32;
                out.copy_from_slice(&v.to_le_bytes());
            }
        }
    }

    /// Decode interleaved PCM bytes, appending f32 samples to `output`.
    ///
    /// A trailing partial sample is ignored.
    pub fn decode_into(self, data: &[u8], output: &mut Vec<f32>) {
        let bytes = self.bytes_per_sample();
        output.reserve(data.len() / bytes);
        output.extend(data.chunks_exact(bytes).map(|s| self.decode_sample(s)));
    }

    /// Encode f32 samples, appending PCM bytes to `output`.
    pub fn encode_into(self, samples: &[f32], output: &mut Vec<u8>) {
        let bytes = self.bytes_per_sample();
        let start = output.len();
        output.resize(start + samples.len() * bytes, 0);
        for (value, dst) in samples.iter().zip(output[start..].chunks_exact_mut(bytes)) {
            self.encode_sample(*value, dst);
        }
    }
}
