//! The in-memory configuration record.

use heapless::Vec;
use moar_core::{ArgMethod, EnvelopeMode, FilterCurve};

use crate::error::ConfigError;
use crate::layout::{ENVELOPE_COUNT, MAX_CHANNELS};

/// Highest MIDI output channel.
pub const MIDI_CHANNELS: u8 = 16;

/// Largest CC number.
pub const MAX_CC: u8 = 127;

/// Storage sentinel for a channel with no envelope.
pub const UNASSIGNED: u8 = 255;

/// LED brightness after a reset.
pub const DEFAULT_BRIGHTNESS: u8 = 128;

/// LED colour after a reset.
pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// ARG source pair after a reset (the first candidate pair).
pub const DEFAULT_ARG_PAIR: (u8, u8) = (1, 2);

/// Full persisted configuration.
///
/// Every setter validates its input and returns `false`, leaving the record
/// unchanged, when the index or value is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    outputs: Vec<u8, MAX_CHANNELS>,
    ccs: Vec<u8, MAX_CHANNELS>,
    assignments: Vec<Option<u8>, MAX_CHANNELS>,
    curves: [FilterCurve; ENVELOPE_COUNT],
    led_brightness: u8,
    led_color: [u8; 3],
    mode: EnvelopeMode,
    arg_method: ArgMethod,
    arg_pair: (u8, u8),
}

impl ConfigRecord {
    /// Factory defaults for `channels` channels: output channel 1,
    /// CC = channel index, nothing assigned.
    pub fn defaults(channels: usize) -> Result<Self, ConfigError> {
        let count_error = ConfigError::ChannelCount {
            count: channels,
            max: MAX_CHANNELS,
        };
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(count_error);
        }
        let mut record = Self {
            outputs: Vec::new(),
            ccs: Vec::new(),
            assignments: Vec::new(),
            curves: [FilterCurve::default(); ENVELOPE_COUNT],
            led_brightness: DEFAULT_BRIGHTNESS,
            led_color: DEFAULT_COLOR,
            mode: EnvelopeMode::default(),
            arg_method: ArgMethod::default(),
            arg_pair: DEFAULT_ARG_PAIR,
        };
        record.outputs.resize(channels, 1).map_err(|()| count_error)?;
        record.ccs.resize(channels, 0).map_err(|()| count_error)?;
        record.assignments.resize(channels, None).map_err(|()| count_error)?;
        record.reset_channel_mappings();
        Ok(record)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.outputs.len()
    }

    /// MIDI output channel (1..=16) of channel `index`.
    pub fn output_channel(&self, index: usize) -> Option<u8> {
        self.outputs.get(index).copied()
    }

    /// Sets the output channel. Rejects channels outside 1..=16.
    pub fn set_output_channel(&mut self, index: usize, channel: u8) -> bool {
        match self.outputs.get_mut(index) {
            Some(slot) if (1..=MIDI_CHANNELS).contains(&channel) => {
                *slot = channel;
                true
            }
            _ => false,
        }
    }

    /// CC number of channel `index`.
    pub fn cc_number(&self, index: usize) -> Option<u8> {
        self.ccs.get(index).copied()
    }

    /// Sets the CC number. Rejects values above 127.
    pub fn set_cc_number(&mut self, index: usize, cc: u8) -> bool {
        match self.ccs.get_mut(index) {
            Some(slot) if cc <= MAX_CC => {
                *slot = cc;
                true
            }
            _ => false,
        }
    }

    /// Envelope assigned to channel `index`, if any.
    pub fn envelope_for(&self, index: usize) -> Option<u8> {
        self.assignments.get(index).copied().flatten()
    }

    /// Assigns (or with `None`, unassigns) an envelope to channel `index`.
    pub fn set_envelope_for(&mut self, index: usize, envelope: Option<u8>) -> bool {
        if envelope.is_some_and(|e| usize::from(e) >= ENVELOPE_COUNT) {
            return false;
        }
        match self.assignments.get_mut(index) {
            Some(slot) => {
                *slot = envelope;
                true
            }
            None => false,
        }
    }

    /// Sparse channel to envelope map, one entry per channel.
    pub fn assignments(&self) -> &[Option<u8>] {
        &self.assignments
    }

    /// Removes every envelope assignment.
    pub fn clear_assignments(&mut self) {
        self.assignments.iter_mut().for_each(|slot| *slot = None);
    }

    /// Filter curve of envelope `index`.
    pub fn curve(&self, index: usize) -> Option<FilterCurve> {
        self.curves.get(index).copied()
    }

    /// Sets the filter curve of envelope `index`.
    pub fn set_curve(&mut self, index: usize, curve: FilterCurve) -> bool {
        match self.curves.get_mut(index) {
            Some(slot) => {
                *slot = curve;
                true
            }
            None => false,
        }
    }

    /// LED brightness.
    pub fn led_brightness(&self) -> u8 {
        self.led_brightness
    }

    /// Sets the LED brightness.
    pub fn set_led_brightness(&mut self, brightness: u8) {
        self.led_brightness = brightness;
    }

    /// LED colour as `[r, g, b]`.
    pub fn led_color(&self) -> [u8; 3] {
        self.led_color
    }

    /// Sets the LED colour.
    pub fn set_led_color(&mut self, color: [u8; 3]) {
        self.led_color = color;
    }

    /// Global envelope mode.
    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    /// Sets the global envelope mode.
    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        self.mode = mode;
    }

    /// Global ARG method.
    pub fn arg_method(&self) -> ArgMethod {
        self.arg_method
    }

    /// Sets the global ARG method.
    pub fn set_arg_method(&mut self, method: ArgMethod) {
        self.arg_method = method;
    }

    /// ARG source pair `(a, b)`.
    pub fn arg_pair(&self) -> (u8, u8) {
        self.arg_pair
    }

    /// Sets the ARG source pair. The two sources must differ.
    pub fn set_arg_pair(&mut self, a: u8, b: u8) -> bool {
        if a == b {
            return false;
        }
        self.arg_pair = (a, b);
        true
    }

    /// Resets every channel to output channel 1 and CC = index.
    pub fn reset_channel_mappings(&mut self) {
        for (index, (output, cc)) in self.outputs.iter_mut().zip(self.ccs.iter_mut()).enumerate() {
            *output = 1;
            *cc = (index % 128) as u8;
        }
    }

    /// Repairs out-of-range channel bytes, as left by erased or foreign
    /// images: output channel 0 or above 16 becomes 1, CC above 127
    /// becomes `index % 128`. Returns the number of repaired fields.
    pub fn sanitize(&mut self) -> usize {
        let mut repaired = 0;
        for (index, (output, cc)) in self.outputs.iter_mut().zip(self.ccs.iter_mut()).enumerate() {
            if *output == 0 || *output > MIDI_CHANNELS {
                *output = 1;
                repaired += 1;
            }
            if *cc > MAX_CC {
                *cc = (index % 128) as u8;
                repaired += 1;
            }
        }
        repaired
    }

    pub(crate) fn raw_parts_mut(&mut self) -> RawParts<'_> {
        RawParts {
            outputs: &mut self.outputs,
            ccs: &mut self.ccs,
        }
    }
}

/// Unchecked access to the channel byte arrays for decoding.
pub(crate) struct RawParts<'a> {
    pub(crate) outputs: &'a mut [u8],
    pub(crate) ccs: &'a mut [u8],
}
