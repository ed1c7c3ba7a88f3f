//! Simulation scenario file format.
//!
//! A scenario is a TOML file listing timed input events for the simulated
//! board:
//!
//! ```toml
//! name = "select and sweep"
//! duration_ms = 1500
//!
//! [[events]]
//! kind = "button"
//! at = 0
//! address = 3
//! hold = 120
//!
//! [[events]]
//! kind = "pot"
//! at = 300
//! address = 3
//! value = 1023
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use moar_core::Millis;
use moar_platform::Settings;
use moar_platform::layout::{CONTROL_BUTTONS, MUX_ADDRESSES};
use moar_platform::sim::SimBoard;
use serde::Deserialize;

/// Scenario file contents.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Number of 1 ms ticks to run
    pub duration_ms: Millis,
    /// Timing overrides
    #[serde(default)]
    pub settings: SettingsOverrides,
    /// Timed input events
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Optional replacements for [`Settings`] defaults.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsOverrides {
    pub debounce_ms: Option<Millis>,
    pub long_press_ms: Option<Millis>,
    pub double_press_ms: Option<Millis>,
    pub clear_confirm_ms: Option<Millis>,
    pub rng_seed: Option<u32>,
}

impl SettingsOverrides {
    /// Applies the overrides on top of the defaults.
    pub fn resolve(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(v) = self.debounce_ms {
            settings.debounce_ms = v;
        }
        if let Some(v) = self.long_press_ms {
            settings.long_press_ms = v;
        }
        if let Some(v) = self.double_press_ms {
            settings.double_press_ms = v;
        }
        if let Some(v) = self.clear_confirm_ms {
            settings.clear_confirm_ms = v;
        }
        if let Some(v) = self.rng_seed {
            settings.rng_seed = v;
        }
        settings
    }
}

/// One timed input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Moves the pot at a mux address.
    Pot { at: Millis, address: usize, value: u16 },
    /// Sets a directly wired analog pin (envelope sources, tone pots).
    Analog { at: Millis, pin: u8, value: u16 },
    /// Presses the muxed button at `address` for `hold` ms.
    Button { at: Millis, address: usize, hold: Millis },
    /// Presses control button `index` for `hold` ms.
    Control { at: Millis, index: usize, hold: Millis },
    /// Presses several control buttons together for `hold` ms.
    Chord {
        at: Millis,
        controls: Vec<usize>,
        hold: Millis,
    },
    /// Queues incoming MIDI clock ticks.
    Clock { at: Millis, ticks: u32 },
}

/// A single board change at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Pot(usize, u16),
    Analog(u8, u16),
    Button(usize, bool),
    Control(usize, bool),
    Clock(u32),
}

impl Change {
    /// Applies the change to `board`.
    pub fn apply(self, board: &mut SimBoard) {
        match self {
            Self::Pot(address, value) => board.set_pot(address, value),
            Self::Analog(pin, value) => board.set_analog(pin, value),
            Self::Button(address, pressed) => board.set_button(address, pressed),
            Self::Control(index, pressed) => board.set_control(index, pressed),
            Self::Clock(ticks) => board.queue_clock_ticks(ticks),
        }
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Parses scenario TOML.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for event in &self.events {
            match event {
                Event::Pot { address, .. } | Event::Button { address, .. } if *address >= MUX_ADDRESSES => {
                    bail!("mux address {address} out of range (0..{MUX_ADDRESSES})");
                }
                Event::Control { index, .. } if *index >= CONTROL_BUTTONS => {
                    bail!("control button {index} out of range (0..{CONTROL_BUTTONS})");
                }
                Event::Chord { controls, .. } => {
                    if let Some(index) = controls.iter().find(|&&i| i >= CONTROL_BUTTONS) {
                        bail!("control button {index} out of range (0..{CONTROL_BUTTONS})");
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Expands the events into time-ordered board changes.
    ///
    /// Changes at the same time keep file order, releases included.
    pub fn timeline(&self) -> Vec<(Millis, Change)> {
        let mut changes = Vec::new();
        for event in &self.events {
            match event {
                Event::Pot { at, address, value } => changes.push((*at, Change::Pot(*address, *value))),
                Event::Analog { at, pin, value } => changes.push((*at, Change::Analog(*pin, *value))),
                Event::Button { at, address, hold } => {
                    changes.push((*at, Change::Button(*address, true)));
                    changes.push((at + hold, Change::Button(*address, false)));
                }
                Event::Control { at, index, hold } => {
                    changes.push((*at, Change::Control(*index, true)));
                    changes.push((at + hold, Change::Control(*index, false)));
                }
                Event::Chord { at, controls, hold } => {
                    for index in controls {
                        changes.push((*at, Change::Control(*index, true)));
                        changes.push((at + hold, Change::Control(*index, false)));
                    }
                }
                Event::Clock { at, ticks } => changes.push((*at, Change::Clock(*ticks))),
            }
        }
        changes.sort_by_key(|(at, _)| *at);
        changes
    }
}
