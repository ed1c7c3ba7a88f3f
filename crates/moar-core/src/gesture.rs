//! Press gesture classification.
//!
//! Each input runs a four-phase state machine over its debounced state:
//!
//! ```text
//!   Idle --press--> Pressed --held >= long--> LongPress
//!                      |                          |
//!                   release                    release
//!                      v                          v
//!                   Released <--------------------+
//!                      |
//!                (next step) --> Idle
//! ```
//!
//! `LongPress` fires once, the moment the hold crosses the threshold.
//! `Released` lasts exactly one step; on that step a release that did not
//! follow a long press is classified as a short press. Short presses are
//! reported immediately; a second short release arriving within the
//! double-press window of the previous one is reported as
//! [`GestureEvent::DoublePress`] instead.

use crate::time::{Millis, elapsed};

/// Default hold time before a press becomes a long press.
pub const DEFAULT_LONG_PRESS_MS: Millis = 500;

/// Default maximum gap between two short releases for a double press.
pub const DEFAULT_DOUBLE_PRESS_MS: Millis = 300;

/// Thresholds used by [`ButtonGestureState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Hold time (ms) at which a press becomes a long press.
    pub long_press_ms: Millis,
    /// Release-to-release window (ms) for a double press.
    pub double_press_ms: Millis,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            double_press_ms: DEFAULT_DOUBLE_PRESS_MS,
        }
    }
}

/// Phase of the per-input state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// Not pressed.
    #[default]
    Idle,
    /// Held, long-press threshold not yet reached.
    Pressed,
    /// Held past the long-press threshold.
    LongPress,
    /// Released on the previous step; classified on the next one.
    Released,
}

/// Classified interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureEvent {
    /// Press and release shorter than the long-press threshold.
    ShortPress,
    /// Second short press inside the double-press window.
    DoublePress,
    /// Hold reached the long-press threshold.
    LongPress,
}

/// Gesture state for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonGestureState {
    phase: GesturePhase,
    press_time: Millis,
    release_time: Millis,
    long_press_fired: bool,
    last_short_release: Option<Millis>,
    consumed: bool,
}

impl ButtonGestureState {
    /// Creates an idle state.
    pub const fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            press_time: 0,
            release_time: 0,
            long_press_fired: false,
            last_short_release: None,
            consumed: false,
        }
    }

    /// Advances the machine with the current debounced `pressed` state.
    ///
    /// Call once per scan, every scan: long presses are detected by
    /// elapsed time, not by edges.
    pub fn step(&mut self, pressed: bool, now: Millis, timing: &GestureTiming) -> Option<GestureEvent> {
        match self.phase {
            GesturePhase::Idle => {
                if pressed {
                    self.phase = GesturePhase::Pressed;
                    self.press_time = now;
                }
                None
            }
            GesturePhase::Pressed => {
                if !pressed {
                    self.phase = GesturePhase::Released;
                    self.release_time = now;
                    None
                } else if elapsed(now, self.press_time) >= timing.long_press_ms {
                    self.phase = GesturePhase::LongPress;
                    self.long_press_fired = true;
                    (!self.consumed).then_some(GestureEvent::LongPress)
                } else {
                    None
                }
            }
            GesturePhase::LongPress => {
                if !pressed {
                    self.phase = GesturePhase::Released;
                    self.release_time = now;
                }
                None
            }
            GesturePhase::Released => {
                let event = self.on_release(timing);
                self.phase = GesturePhase::Idle;
                self.long_press_fired = false;
                self.consumed = false;
                event
            }
        }
    }

    fn on_release(&mut self, timing: &GestureTiming) -> Option<GestureEvent> {
        if self.long_press_fired || self.consumed {
            return None;
        }
        let release = self.release_time;
        match self.last_short_release {
            Some(previous) if elapsed(release, previous) < timing.double_press_ms => {
                // The pair is spent; a third quick press starts over.
                self.last_short_release = None;
                Some(GestureEvent::DoublePress)
            }
            _ => {
                self.last_short_release = Some(release);
                Some(GestureEvent::ShortPress)
            }
        }
    }

    /// Marks the current press as used by a chord.
    ///
    /// No further events are produced for this press; the machine returns
    /// to normal once the input is back to idle.
    pub fn consume(&mut self) {
        if self.phase != GesturePhase::Idle {
            self.consumed = true;
        }
        self.last_short_release = None;
    }

    /// Current phase.
    #[inline]
    pub const fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// True while a long press is active or just released.
    #[inline]
    pub const fn long_press_fired(&self) -> bool {
        self.long_press_fired
    }

    /// Timestamp of the current/last press.
    #[inline]
    pub const fn press_time(&self) -> Millis {
        self.press_time
    }

    /// Timestamp of the last release. Meaningful once in `Released`.
    #[inline]
    pub const fn release_time(&self) -> Millis {
        self.release_time
    }
}
