//! Host-side simulated board.
//!
//! [`SimBoard`] implements every collaborator trait in memory: pots and
//! buttons are set directly, and everything the controller emits (control
//! changes, status text, display snapshots, LED state) is recorded for
//! inspection. Used by the tests and the `moar` CLI.

use std::collections::HashMap;

use moar_core::{ADC_MAX, Millis};

use crate::context::DisplaySnapshot;
use crate::layout::{
    BUTTON_SENSE_PIN, CONTROL_BUTTONS, CONTROL_PINS, MUX_ADDRESSES, POT_SENSE_PIN, PRIMARY_MUX_PINS,
    SECONDARY_MUX_PINS,
};
use crate::mux::SLOTS_PER_BANK;
use crate::{AnalogIo, ControlSink, LedIndicator, MidiClock, StatusDisplay};

/// One control change as sent by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentControl {
    /// Control number.
    pub control: u8,
    /// Value.
    pub value: u8,
    /// MIDI channel.
    pub channel: u8,
}

/// In-memory board.
#[derive(Debug, Clone)]
pub struct SimBoard {
    pots: [u16; MUX_ADDRESSES],
    buttons: [bool; MUX_ADDRESSES],
    controls: [bool; CONTROL_BUTTONS],
    analog: HashMap<u8, u16>,
    bank: u8,
    slot: u8,
    mux_writes: usize,
    clock_ticks: u32,
    sent: Vec<SentControl>,
    statuses: Vec<String>,
    snapshots: Vec<DisplaySnapshot>,
    levels: [u8; MUX_ADDRESSES],
    highlight: Option<u8>,
    follow: bool,
    appearance: (u8, [u8; 3]),
    refreshes: usize,
}

impl SimBoard {
    /// All pots at zero, nothing pressed.
    pub fn new() -> Self {
        Self {
            pots: [0; MUX_ADDRESSES],
            buttons: [false; MUX_ADDRESSES],
            controls: [false; CONTROL_BUTTONS],
            analog: HashMap::new(),
            bank: 0,
            slot: 0,
            mux_writes: 0,
            clock_ticks: 0,
            sent: Vec::new(),
            statuses: Vec::new(),
            snapshots: Vec::new(),
            levels: [0; MUX_ADDRESSES],
            highlight: None,
            follow: false,
            appearance: (0, [0; 3]),
            refreshes: 0,
        }
    }

    /// Sets the raw reading (clamped to 0..=1023) of the pot at mux `address`.
    pub fn set_pot(&mut self, address: usize, raw: u16) {
        if let Some(pot) = self.pots.get_mut(address) {
            *pot = raw.min(ADC_MAX);
        }
    }

    /// Presses or releases the muxed button at `address`.
    pub fn set_button(&mut self, address: usize, pressed: bool) {
        if let Some(button) = self.buttons.get_mut(address) {
            *button = pressed;
        }
    }

    /// Presses or releases control button `index`.
    pub fn set_control(&mut self, index: usize, pressed: bool) {
        if let Some(control) = self.controls.get_mut(index) {
            *control = pressed;
        }
    }

    /// Sets the reading of a directly wired analog pin.
    pub fn set_analog(&mut self, pin: u8, raw: u16) {
        self.analog.insert(pin, raw.min(ADC_MAX));
    }

    /// Queues MIDI clock ticks, delivered one per poll.
    pub fn queue_clock_ticks(&mut self, ticks: u32) {
        self.clock_ticks += ticks;
    }

    /// Every control change sent so far.
    pub fn sent(&self) -> &[SentControl] {
        &self.sent
    }

    /// Drains the sent control changes.
    pub fn take_sent(&mut self) -> Vec<SentControl> {
        std::mem::take(&mut self.sent)
    }

    /// Every status message shown so far.
    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    /// Most recent status message.
    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }

    /// Most recent display snapshot.
    pub fn last_snapshot(&self) -> Option<&DisplaySnapshot> {
        self.snapshots.last()
    }

    /// LED level at `index`.
    pub fn level(&self, index: usize) -> u8 {
        self.levels.get(index).copied().unwrap_or(0)
    }

    /// Highlighted channel.
    pub fn highlight(&self) -> Option<u8> {
        self.highlight
    }

    /// Whether the LEDs show follow mode.
    pub fn follow_indicated(&self) -> bool {
        self.follow
    }

    /// Brightness and colour last applied.
    pub fn appearance(&self) -> (u8, [u8; 3]) {
        self.appearance
    }

    /// Number of LED refreshes.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Number of mux bank writes.
    pub fn mux_writes(&self) -> usize {
        self.mux_writes
    }

    fn address(&self) -> usize {
        usize::from(self.bank * SLOTS_PER_BANK + self.slot)
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogIo for SimBoard {
    fn analog_read(&mut self, pin: u8) -> u16 {
        match pin {
            POT_SENSE_PIN => self.pots[self.address()],
            BUTTON_SENSE_PIN => {
                if self.buttons[self.address()] {
                    0
                } else {
                    ADC_MAX
                }
            }
            _ => self.analog.get(&pin).copied().unwrap_or(0),
        }
    }

    fn digital_read(&mut self, pin: u8) -> bool {
        // Active low: released reads high.
        match CONTROL_PINS.iter().position(|&p| p == pin) {
            Some(index) => !self.controls[index],
            None => true,
        }
    }

    fn select_mux_address(&mut self, bank_pins: &[u8], address: u8) {
        let address = address % SLOTS_PER_BANK;
        if bank_pins == PRIMARY_MUX_PINS {
            self.bank = address;
        } else if bank_pins == SECONDARY_MUX_PINS {
            self.slot = address;
        }
        self.mux_writes += 1;
    }
}

impl ControlSink for SimBoard {
    fn send_control_change(&mut self, control: u8, value: u8, channel: u8) {
        self.sent.push(SentControl { control, value, channel });
    }
}

impl MidiClock for SimBoard {
    fn poll_clock_tick(&mut self) -> bool {
        if self.clock_ticks == 0 {
            return false;
        }
        self.clock_ticks -= 1;
        true
    }
}

impl StatusDisplay for SimBoard {
    fn show_status(&mut self, text: &str, _duration_ms: Millis) {
        self.statuses.push(text.into());
    }

    fn show_snapshot(&mut self, snapshot: &DisplaySnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

impl LedIndicator for SimBoard {
    fn set_level(&mut self, index: usize, value: u8) {
        if let Some(level) = self.levels.get_mut(index) {
            *level = value;
        }
    }

    fn set_highlight(&mut self, index: Option<u8>) {
        self.highlight = index;
    }

    fn indicate_follow(&mut self, enabled: bool) {
        self.follow = enabled;
    }

    fn set_appearance(&mut self, brightness: u8, color: [u8; 3]) {
        self.appearance = (brightness, color);
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}
