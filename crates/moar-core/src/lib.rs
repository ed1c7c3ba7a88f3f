//! Moar Core - control-surface primitives for the moar MIDI controller
//!
//! This crate holds the hardware-independent building blocks of the
//! controller firmware. Everything is allocation-free and runs on a
//! wrapping millisecond clock, so the same code drives the device and the
//! host-side simulator.
//!
//! # Core Abstractions
//!
//! ## Scheduling
//!
//! - [`TaskScheduler`] - Fixed-capacity cooperative scheduler of periodic actions
//! - [`elapsed`] - Wraparound-safe elapsed time on a [`Millis`] clock
//!
//! ## Input Conditioning
//!
//! - [`Debouncer`] / [`debounce`] - Contact debouncing
//! - [`ButtonGestureState`] - Short, double and long press classification
//! - [`ExponentialSmoother`] / [`ChangeDetector`] - Pot smoothing with hysteresis
//!
//! ## Envelopes
//!
//! - [`BiquadFilter`] - Second-order IIR with RBJ cookbook coefficients
//! - [`FilterCurve`] - Static and filtered single-source curves
//! - [`ArgMethod`] - Two-source arithmetic combiner
//!
//! ## Utilities
//!
//! - Mapping: [`map_range`], [`map_to_midi`], [`map_exponential`]
//! - [`Xorshift32`] - Cheap PRNG for randomize actions
//! - [`TapTempo`] / [`BeatCounter`] - Tempo capture and clock display
//!
//! # no_std Support
//!
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! moar-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to get diagnostic events from the
//! scheduler and filter configuration.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod curve;
pub mod debounce;
pub mod gesture;
pub mod math;
pub mod rng;
pub mod scheduler;
pub mod smoothing;
pub mod tempo;
pub mod time;

// Re-export main types at crate root
pub use biquad::{BiquadFilter, FilterKind};
pub use curve::{ArgMethod, EnvelopeMode, FilterCurve};
pub use debounce::{Debouncer, debounce};
pub use gesture::{ButtonGestureState, GestureEvent, GesturePhase, GestureTiming};
pub use math::{ADC_MAX, MIDI_MAX, clamp_midi, map_exponential, map_range, map_to_midi};
pub use rng::Xorshift32;
pub use scheduler::{Action, Task, TaskScheduler};
pub use smoothing::{ChangeDetector, ExponentialSmoother};
pub use tempo::{BeatCounter, TapTempo};
pub use time::{Millis, elapsed};
