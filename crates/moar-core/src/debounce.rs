//! Contact debouncing for buttons.
//!
//! A raw reading must hold steady for longer than the debounce delay before
//! it is accepted as the new stable state. Any flicker inside the window
//! restarts the timer, so a burst of bounces collapses into at most one
//! reported transition.

use crate::time::{Millis, elapsed};

/// Per-input debounce state.
///
/// # Example
///
/// ```rust
/// use moar_core::Debouncer;
///
/// let mut button = Debouncer::new();
/// assert!(!button.update(true, 0, 50)); // raw press seen
/// assert!(!button.update(true, 30, 50)); // still settling
/// assert!(button.update(true, 51, 50)); // accepted
/// assert!(button.is_pressed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Debouncer {
    stable: bool,
    last_raw: bool,
    last_change: Millis,
}

impl Debouncer {
    /// Creates a debouncer in the released state.
    pub const fn new() -> Self {
        Self {
            stable: false,
            last_raw: false,
            last_change: 0,
        }
    }

    /// Feeds one raw reading taken at `now`.
    ///
    /// Returns `true` exactly when the stable state flips.
    pub fn update(&mut self, raw: bool, now: Millis, delay: Millis) -> bool {
        debounce(
            &mut self.stable,
            &mut self.last_raw,
            raw,
            &mut self.last_change,
            now,
            delay,
        )
    }

    /// Current accepted state.
    #[inline]
    pub const fn is_pressed(&self) -> bool {
        self.stable
    }

    /// Timestamp of the last raw edge.
    #[inline]
    pub const fn last_change(&self) -> Millis {
        self.last_change
    }
}

/// Free-function form of the debounce contract.
///
/// `last_change_time` is restarted whenever `raw` differs from the previous
/// raw reading. A change is accepted into `previous_stable` once `raw` has
/// held for strictly more than `delay` ms and differs from the stable value.
/// Returns `true` only on that acceptance.
pub fn debounce(
    previous_stable: &mut bool,
    previous_raw: &mut bool,
    raw: bool,
    last_change_time: &mut Millis,
    now: Millis,
    delay: Millis,
) -> bool {
    if raw != *previous_raw {
        *previous_raw = raw;
        *last_change_time = now;
    }
    if raw != *previous_stable && elapsed(now, *last_change_time) > delay {
        *previous_stable = raw;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_after_delay() {
        let mut d = Debouncer::new();
        assert!(!d.update(true, 100, 50));
        assert!(!d.update(true, 150, 50));
        assert!(d.update(true, 151, 50));
        assert!(d.is_pressed());
        // Holding does not report again.
        assert!(!d.update(true, 500, 50));
    }

    #[test]
    fn test_bounce_restarts_window() {
        let mut d = Debouncer::new();
        d.update(true, 0, 50);
        d.update(false, 20, 50);
        d.update(true, 40, 50);
        assert!(!d.update(true, 80, 50));
        assert!(d.update(true, 91, 50));
    }

    #[test]
    fn test_short_glitch_is_ignored() {
        let mut d = Debouncer::new();
        d.update(true, 0, 50);
        d.update(false, 10, 50);
        for now in 11..200 {
            assert!(!d.update(false, now, 50));
        }
        assert!(!d.is_pressed());
    }

    #[test]
    fn test_release_reported() {
        let mut d = Debouncer::new();
        d.update(true, 0, 50);
        assert!(d.update(true, 60, 50));
        d.update(false, 100, 50);
        assert!(d.update(false, 151, 50));
        assert!(!d.is_pressed());
        assert_eq!(d.last_change(), 100);
    }
}
