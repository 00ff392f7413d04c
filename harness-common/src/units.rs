//! Unit conversion between harness scales and engine scales
//!
//! The game calls the audio harness with DirectSound-era units. Every backend
//! variant converts them with the helpers below so the mapping is identical
//! whichever backend is linked:
//!
//! | Harness value | Range | Engine value |
//! |---|---|---|
//! | volume | 0 ..= 255 | linear gain 0.0 ..= 1.0 |
//! | pan | -10000 ..= 10000 | balance -1.0 (left) ..= 1.0 (right) |
//! | frequency | original rate, new rate (Hz) | pitch ratio `new / original` |

/// Highest harness volume value (maps to linear 1.0)
pub const MAX_VOLUME: i32 = 255;

/// Magnitude of the harness pan scale (-10000 = full left, 10000 = full right)
pub const PAN_RANGE: i32 = 10000;

/// Convert a harness volume (0-255) to a linear gain.
///
/// Values outside 0..=255 are clamped.
///
/// # Examples
/// ```
/// use harness_common::units::volume_to_linear;
/// assert_eq!(volume_to_linear(255), 1.0);
/// assert_eq!(volume_to_linear(0), 0.0);
/// ```
pub fn volume_to_linear(volume: i32) -> f32 {
    volume.clamp(0, MAX_VOLUME) as f32 / MAX_VOLUME as f32
}

/// Convert a harness pan value (-10000..=10000) to an engine balance (-1.0..=1.0).
pub fn pan_to_balance(pan: i32) -> f32 {
    pan.clamp(-PAN_RANGE, PAN_RANGE) as f32 / PAN_RANGE as f32
}

/// Convert a playback frequency change into a linear pitch ratio.
///
/// Non-positive rates cannot describe a pitch, so they leave pitch at 1.0.
pub fn pitch_from_rates(original_rate: i32, new_rate: i32) -> f32 {
    if original_rate <= 0 || new_rate <= 0 {
        return 1.0;
    }
    new_rate as f32 / original_rate as f32
}

/// Per-channel gains for a balance value.
///
/// Balance law: a positive balance attenuates the left channel, a negative
/// balance attenuates the right channel, the other side stays at unity.
/// Centre (0.0) leaves both channels at 1.0.
///
/// # Returns
/// `(left_gain, right_gain)`
pub fn balance_gains(balance: f32) -> (f32, f32) {
    let b = balance.clamp(-1.0, 1.0);
    if b > 0.0 {
        (1.0 - b, 1.0)
    } else {
        (1.0, 1.0 + b)
    }
}
