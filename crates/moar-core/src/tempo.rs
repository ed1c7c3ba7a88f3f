//! Tap tempo and MIDI clock beat tracking.

use crate::time::{Millis, elapsed};

/// Taps further apart than this start a new measurement.
pub const MAX_TAP_INTERVAL_MS: Millis = 3000;

/// Number of steps in the display beat cycle.
pub const BEAT_STEPS: u8 = 8;

/// Tap-tempo timing capture.
///
/// # Example
///
/// ```rust
/// use moar_core::TapTempo;
///
/// let mut tap = TapTempo::new();
/// assert_eq!(tap.tap(1000), None);
/// assert_eq!(tap.tap(1500), Some(120.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TapTempo {
    last_tap: Option<Millis>,
    interval_ms: Option<Millis>,
}

impl TapTempo {
    /// Creates an empty tap tempo.
    pub const fn new() -> Self {
        Self {
            last_tap: None,
            interval_ms: None,
        }
    }

    /// Records a tap at `now` and returns the derived BPM if the previous
    /// tap was recent enough.
    pub fn tap(&mut self, now: Millis) -> Option<f32> {
        let previous = self.last_tap.replace(now);
        let interval = elapsed(now, previous?);
        if interval == 0 || interval > MAX_TAP_INTERVAL_MS {
            return None;
        }
        self.interval_ms = Some(interval);
        self.bpm()
    }

    /// Last measured inter-tap interval.
    pub const fn interval_ms(&self) -> Option<Millis> {
        self.interval_ms
    }

    /// Tempo from the last measured interval: `60000 / interval_ms`.
    pub fn bpm(&self) -> Option<f32> {
        self.interval_ms.map(|ms| 60_000.0 / ms as f32)
    }
}

/// Beat position advanced by incoming MIDI clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeatCounter {
    position: u8,
}

impl BeatCounter {
    /// Creates a counter at step 0.
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Advances one step on a clock tick and returns the new position.
    pub fn clock(&mut self) -> u8 {
        self.position = (self.position + 1) % BEAT_STEPS;
        self.position
    }

    /// Current step in `0..BEAT_STEPS`.
    pub const fn position(&self) -> u8 {
        self.position
    }
}
