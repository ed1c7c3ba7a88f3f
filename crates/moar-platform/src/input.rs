//! Button scanning, gesture classification and chord detection.
//!
//! Inputs share one index space: the first [`VIRTUAL_BUTTONS`] are muxed
//! buttons (read as an analog level below [`BUTTON_THRESHOLD`]), the rest
//! are active-low control buttons on [`CONTROL_PINS`]. Every input gets the
//! same debounce and the same gesture state machine.
//!
//! Each scan runs in four passes:
//!
//! 1. sample and debounce every input
//! 2. step every gesture machine, collecting events
//! 3. check the control-button chord mask; a new chord consumes its buttons
//!    and drops their events
//! 4. dispatch the remaining events through their [`Binding`]s

use heapless::Vec;
use moar_config::NvStorage;
use moar_core::{ButtonGestureState, Debouncer, GestureEvent, Millis};

use crate::Board;
use crate::action::Action;
use crate::context::ControlContext;
use crate::layout::{BUTTON_SENSE_PIN, BUTTON_THRESHOLD, CONTROL_BUTTONS, CONTROL_PINS, INPUT_COUNT, VIRTUAL_BUTTONS};

/// Where an input is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Muxed button at this mux address (same address as its pot).
    Virtual(u8),
    /// Direct-wired control button by position in [`CONTROL_PINS`].
    Control(u8),
}

impl InputSource {
    /// Source of input `index`, if it exists.
    pub fn from_index(index: usize) -> Option<Self> {
        if index < VIRTUAL_BUTTONS {
            Some(Self::Virtual(index as u8))
        } else if index < INPUT_COUNT {
            Some(Self::Control((index - VIRTUAL_BUTTONS) as u8))
        } else {
            None
        }
    }

    /// Flat input index.
    pub fn index(self) -> usize {
        match self {
            Self::Virtual(i) => usize::from(i),
            Self::Control(k) => VIRTUAL_BUTTONS + usize::from(k),
        }
    }

    /// Actions bound to this input.
    pub fn binding(self) -> Binding {
        match self {
            Self::Virtual(i) => Binding::new(Action::SelectChannel(i), Some(Action::CycleAssignment), Some(Action::CycleCc)),
            Self::Control(0) => Binding::new(Action::ToggleFollow, None, Some(Action::ToggleMode)),
            Self::Control(1) => Binding::new(Action::CycleSubChannel, Some(Action::CycleCc), Some(Action::CycleCurve)),
            Self::Control(2) => Binding::new(Action::Save, None, Some(Action::Load)),
            Self::Control(3) => Binding::new(Action::Randomize, None, Some(Action::CycleArgMethod)),
            Self::Control(4) => Binding::new(Action::CycleArgPair, None, Some(Action::CycleAssignment)),
            Self::Control(_) => Binding::new(Action::TapTempo, None, Some(Action::Clear)),
        }
    }
}

/// Gesture-to-action table of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Single short press.
    pub short: Action,
    /// Second short press inside the double-press window. Falls back to
    /// `short` when unbound.
    pub double: Option<Action>,
    /// Hold past the long-press threshold.
    pub long: Option<Action>,
}

impl Binding {
    /// Creates a binding.
    pub const fn new(short: Action, double: Option<Action>, long: Option<Action>) -> Self {
        Self { short, double, long }
    }

    /// Action for `event`, if bound.
    pub fn action(&self, event: GestureEvent) -> Option<Action> {
        match event {
            GestureEvent::ShortPress => Some(self.short),
            GestureEvent::DoublePress => Some(self.double.unwrap_or(self.short)),
            GestureEvent::LongPress => self.long,
        }
    }
}

/// Composite action for exactly two control buttons held together.
///
/// Bit `k` of `mask` is control button `k`.
pub fn chord_for(mask: u8) -> Option<Action> {
    match mask {
        0b10_0001 => Some(Action::Save),
        0b00_1100 => Some(Action::Load),
        0b01_0010 => Some(Action::Reboot),
        0b00_0011 => Some(Action::CycleArgMethod),
        0b00_0110 => Some(Action::CycleCurveFamily),
        0b00_1001 => Some(Action::FollowRandom),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct InputState {
    source: InputSource,
    debouncer: Debouncer,
    gesture: ButtonGestureState,
}

/// Gesture state for every input plus the chord tracker.
#[derive(Debug, Clone)]
pub struct InputGestureManager {
    inputs: [InputState; INPUT_COUNT],
    chord_mask: u8,
}

impl InputGestureManager {
    /// Creates idle state for every input.
    pub fn new() -> Self {
        Self {
            inputs: core::array::from_fn(|index| InputState {
                source: InputSource::from_index(index).unwrap_or(InputSource::Virtual(0)),
                debouncer: Debouncer::new(),
                gesture: ButtonGestureState::new(),
            }),
            chord_mask: 0,
        }
    }

    /// Debounced state of input `index`.
    pub fn is_pressed(&self, index: usize) -> bool {
        self.inputs.get(index).is_some_and(|i| i.debouncer.is_pressed())
    }

    /// Gesture state of input `index`.
    pub fn gesture(&self, index: usize) -> Option<&ButtonGestureState> {
        self.inputs.get(index).map(|i| &i.gesture)
    }

    /// Control buttons currently held, bit `k` for button `k`.
    #[inline]
    pub fn chord_mask(&self) -> u8 {
        self.chord_mask
    }

    /// Reads every input once and dispatches resulting actions.
    ///
    /// Returns the number of actions executed.
    pub fn scan<B: Board, S: NvStorage>(&mut self, ctx: &mut ControlContext<B, S>, now: Millis) -> usize {
        let timing = ctx.settings.gesture_timing();
        let delay = ctx.settings.debounce_ms;

        let mut mask = 0u8;
        for input in self.inputs.iter_mut() {
            let raw = match input.source {
                InputSource::Virtual(address) => {
                    ctx.mux.select(&mut ctx.board, address);
                    ctx.board.analog_read(BUTTON_SENSE_PIN) < BUTTON_THRESHOLD
                }
                InputSource::Control(k) => !ctx.board.digital_read(CONTROL_PINS[usize::from(k)]),
            };
            input.debouncer.update(raw, now, delay);
            if let InputSource::Control(k) = input.source
                && input.debouncer.is_pressed()
            {
                mask |= 1 << k;
            }
        }

        let mut events: Vec<(InputSource, GestureEvent), INPUT_COUNT> = Vec::new();
        for input in self.inputs.iter_mut() {
            if let Some(event) = input.gesture.step(input.debouncer.is_pressed(), now, &timing) {
                // One event per input per scan; capacity equals input count.
                let _ = events.push((input.source, event));
            }
        }

        let mut dispatched = 0;
        if mask != self.chord_mask {
            self.chord_mask = mask;
            if let Some(action) = chord_for(mask) {
                for k in 0..CONTROL_BUTTONS {
                    if mask & (1 << k) != 0 {
                        self.inputs[VIRTUAL_BUTTONS + k].gesture.consume();
                    }
                }
                events.retain(|(source, _)| match source {
                    InputSource::Control(k) => mask & (1 << k) == 0,
                    InputSource::Virtual(_) => true,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(mask, ?action, "chord");

                action.execute(ctx, now);
                dispatched += 1;
            }
        }

        for (source, event) in events {
            let Some(action) = source.binding().action(event) else {
                continue;
            };
            if let InputSource::Virtual(address) = source
                && event != GestureEvent::ShortPress
            {
                ctx.select_channel(address);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(?source, ?event, ?action, "gesture");

            action.execute(ctx, now);
            dispatched += 1;
        }
        dispatched
    }
}

impl Default for InputGestureManager {
    fn default() -> Self {
        Self::new()
    }
}
