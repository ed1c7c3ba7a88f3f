//! Integer and float range mapping helpers.

use libm::powf;

/// Full-scale ADC reading (10-bit converter).
pub const ADC_MAX: u16 = 1023;

/// Largest 7-bit MIDI data value.
pub const MIDI_MAX: u8 = 127;

/// Linearly re-maps `value` from `in_min..=in_max` onto `out_min..=out_max`.
///
/// Integer arithmetic with truncation toward zero; inputs outside the input
/// range extrapolate. A degenerate input range returns `out_min`.
#[inline]
pub const fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Maps a 10-bit ADC reading onto 0..=127. Readings above full scale clamp.
#[inline]
pub const fn map_to_midi(raw: u16) -> u8 {
    let raw = if raw > ADC_MAX { ADC_MAX } else { raw };
    map_range(raw as i32, 0, ADC_MAX as i32, 0, MIDI_MAX as i32) as u8
}

/// Clamps a signed intermediate result into 0..=127.
#[inline]
pub const fn clamp_midi(value: i32) -> u8 {
    if value < 0 {
        0
    } else if value > MIDI_MAX as i32 {
        MIDI_MAX
    } else {
        value as u8
    }
}

/// Maps `value` onto an output range along a power curve.
///
/// The input is normalised to 0..1 (and clamped there), raised to
/// `exponent`, then scaled onto `out_min..out_max`.
pub fn map_exponential(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32, exponent: f32) -> f32 {
    let span = in_max - in_min;
    if span == 0.0 {
        return out_min;
    }
    let normalized = ((value - in_min) / span).clamp(0.0, 1.0);
    powf(normalized, exponent) * (out_max - out_min) + out_min
}
