//! Runtime timing tunables.

use moar_core::biquad::DEFAULT_SAMPLE_RATE;
use moar_core::{GestureTiming, Millis};

/// Timing and rate settings for one controller instance.
///
/// `Default` gives the values the hardware ships with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Raw button state must hold this long before it is accepted.
    pub debounce_ms: Millis,
    /// Hold time for a long press.
    pub long_press_ms: Millis,
    /// Release-to-release window for a double press.
    pub double_press_ms: Millis,
    /// Period of the high-rate tier (MIDI clock).
    pub high_tier_ms: Millis,
    /// Period of the mid-rate tier (envelopes, tone pots).
    pub mid_tier_ms: Millis,
    /// Period of the low-rate tier (LEDs).
    pub low_tier_ms: Millis,
    /// Display refresh period.
    pub display_ms: Millis,
    /// Loop-rate report period.
    pub load_report_ms: Millis,
    /// How long status messages stay on screen.
    pub status_ms: Millis,
    /// Window in which a second clear request confirms the first.
    pub clear_confirm_ms: Millis,
    /// Sample rate handed to the envelope biquads.
    pub envelope_sample_rate: f32,
    /// Seed for the randomize actions and the `Random` curve.
    pub rng_seed: u32,
}

impl Settings {
    /// Gesture thresholds derived from these settings.
    pub fn gesture_timing(&self) -> GestureTiming {
        GestureTiming {
            long_press_ms: self.long_press_ms,
            double_press_ms: self.double_press_ms,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            long_press_ms: 500,
            double_press_ms: 300,
            high_tier_ms: 1,
            mid_tier_ms: 5,
            low_tier_ms: 50,
            display_ms: 100,
            load_report_ms: 1000,
            status_ms: 2000,
            clear_confirm_ms: 3000,
            envelope_sample_rate: DEFAULT_SAMPLE_RATE,
            rng_seed: 0x4D4F_4152,
        }
    }
}
