//! Moar Platform - Control-surface runtime for the moar MIDI controller
//!
//! This crate wires the primitives from `moar-core` and the store from
//! `moar-config` into the controller's cooperative main loop. Hardware is
//! reached only through the collaborator traits defined here, so the same
//! runtime drives the Teensy firmware and the host simulator.
//!
//! # Core Abstractions
//!
//! ## Collaborators
//!
//! - [`AnalogIo`] - Analog/digital reads and mux address lines
//! - [`ControlSink`] - Outbound control-change messages
//! - [`MidiClock`] - Incoming MIDI clock ticks
//! - [`StatusDisplay`] - Status text and snapshot rendering
//! - [`LedIndicator`] - Per-channel LED levels
//! - [`Board`] - Everything above, implemented automatically
//!
//! ## Runtime
//!
//! - [`ChannelScanner`] - Oversampled, smoothed pot scanning through a [`Mux`]
//! - [`EnvelopeProcessor`] - SEF/ARG envelope extraction and output modulation
//! - [`InputGestureManager`] - Debounced gestures and chords dispatched as [`Action`]s
//! - [`ControlContext`] - Shared mutable state handed to every handler
//! - [`Orchestrator`] - Three scheduler tiers plus input and channel scanning
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! moar-platform = { version = "0.1", default-features = false }
//! ```
//!
//! The [`sim`] module (host-side simulated board) requires `std`.
//!
//! # Example
//!
//! ```rust
//! use moar_config::MemoryStorage;
//! use moar_platform::{Orchestrator, Settings, layout, sim::SimBoard};
//!
//! let storage = MemoryStorage::<{ layout::NV_CAPACITY }>::new();
//! let mut controller = Orchestrator::new(SimBoard::new(), storage, Settings::default()).unwrap();
//!
//! for now in 0..100 {
//!     controller.tick(now);
//! }
//! assert!(!controller.is_halted());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod action;
pub mod context;
pub mod envelope;
pub mod input;
pub mod layout;
pub mod mux;
pub mod orchestrator;
pub mod scanner;
pub mod settings;
#[cfg(feature = "std")]
pub mod sim;
pub mod tone;

pub use action::Action;
pub use context::{ControlContext, DisplaySnapshot};
pub use envelope::{EnvelopeChannel, EnvelopeProcessor};
pub use input::{Binding, InputGestureManager, InputSource, chord_for};
pub use mux::Mux;
pub use orchestrator::{Orchestrator, RunState};
pub use scanner::{Channel, ChannelChange, ChannelScanner};
pub use settings::Settings;
pub use tone::ToneControl;

use moar_core::Millis;

/// Analog and digital inputs plus multiplexer address lines.
///
/// All calls are synchronous and must not block.
pub trait AnalogIo {
    /// Reads a 10-bit analog value (0..=1023).
    fn analog_read(&mut self, pin: u8) -> u16;

    /// Reads a digital pin; `true` is logic high.
    fn digital_read(&mut self, pin: u8) -> bool;

    /// Drives `bank_pins` with the binary representation of `address`,
    /// least significant bit on the first pin.
    fn select_mux_address(&mut self, bank_pins: &[u8], address: u8);
}

/// Outbound MIDI control-change messages.
pub trait ControlSink {
    /// Sends `value` on `control` over MIDI `channel` (1..=16).
    fn send_control_change(&mut self, control: u8, value: u8, channel: u8);
}

/// Incoming MIDI clock.
pub trait MidiClock {
    /// Returns `true` once per received clock tick.
    fn poll_clock_tick(&mut self) -> bool;
}

/// Status display. Fire-and-forget.
pub trait StatusDisplay {
    /// Shows `text` for `duration_ms`.
    fn show_status(&mut self, text: &str, duration_ms: Millis);

    /// Renders the periodic status snapshot.
    fn show_snapshot(&mut self, snapshot: &DisplaySnapshot);
}

/// Per-channel LED strip. Fire-and-forget.
pub trait LedIndicator {
    /// Sets the level (0..=127) shown for `index`.
    fn set_level(&mut self, index: usize, value: u8);

    /// Highlights the active channel, or none.
    fn set_highlight(&mut self, index: Option<u8>);

    /// Shows whether envelope follow mode is on.
    fn indicate_follow(&mut self, enabled: bool);

    /// Applies global brightness and colour.
    fn set_appearance(&mut self, brightness: u8, color: [u8; 3]);

    /// Pushes pending changes to the strip.
    fn refresh(&mut self);
}

/// A complete controller board.
pub trait Board: AnalogIo + ControlSink + MidiClock + StatusDisplay + LedIndicator {}

impl<T: AnalogIo + ControlSink + MidiClock + StatusDisplay + LedIndicator> Board for T {}
