//! Potentiometer scanning through the multiplexer tree.
//!
//! Each pass visits every channel in index order: select its mux address,
//! average [`OVERSAMPLE`] reads, feed the exponential smoother and report
//! through the change detector. Only a reported change whose mapped 0-127
//! value differs from the last one handed out reaches the callback.

use heapless::Vec;
use moar_config::{ConfigError, ConfigRecord, MAX_CC, MAX_CHANNELS, MIDI_CHANNELS};
use moar_core::{ChangeDetector, ExponentialSmoother, map_to_midi};
use moar_core::smoothing::{DEFAULT_ALPHA, DEFAULT_JITTER_THRESHOLD};

use crate::AnalogIo;
use crate::layout::{OVERSAMPLE, POT_SENSE_PIN};
use crate::mux::Mux;

/// One pot and its outbound destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    index: u8,
    midi_channel: u8,
    cc: u8,
    smoother: ExponentialSmoother,
    detector: ChangeDetector,
    last_value: Option<u8>,
    dirty: bool,
}

impl Channel {
    fn new(index: u8) -> Self {
        Self {
            index,
            midi_channel: 1,
            cc: index % (MAX_CC + 1),
            smoother: ExponentialSmoother::new(DEFAULT_ALPHA),
            detector: ChangeDetector::new(DEFAULT_JITTER_THRESHOLD),
            last_value: None,
            dirty: false,
        }
    }

    /// Mux address of this channel.
    #[inline]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Output MIDI channel (1..=16).
    #[inline]
    pub fn midi_channel(&self) -> u8 {
        self.midi_channel
    }

    /// Control number (0..=127).
    #[inline]
    pub fn cc(&self) -> u8 {
        self.cc
    }

    /// Last value reported, if any.
    #[inline]
    pub fn last_value(&self) -> Option<u8> {
        self.last_value
    }

    /// Current smoothed raw reading.
    #[inline]
    pub fn smoothed(&self) -> Option<f32> {
        self.smoother.value()
    }

    /// True when a change has been reported since the flag was last cleared.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// A reported channel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelChange {
    /// Channel index.
    pub index: u8,
    /// Output MIDI channel.
    pub midi_channel: u8,
    /// Control number.
    pub cc: u8,
    /// New value (0..=127).
    pub value: u8,
}

/// All pots of the controller.
#[derive(Debug, Clone)]
pub struct ChannelScanner {
    channels: Vec<Channel, MAX_CHANNELS>,
}

impl ChannelScanner {
    /// Creates `count` channels with default mappings (channel 1, CC = index).
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if count == 0 || count > MAX_CHANNELS {
            return Err(ConfigError::ChannelCount {
                count,
                max: MAX_CHANNELS,
            });
        }
        let mut channels = Vec::new();
        for index in 0..count {
            // Bounded by the capacity check above.
            let _ = channels.push(Channel::new(index as u8));
        }
        Ok(Self { channels })
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false; a scanner has at least one channel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel at `index`.
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// All channels in index order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Last reported value of `index`.
    pub fn last_value(&self, index: usize) -> Option<u8> {
        self.channels.get(index).and_then(Channel::last_value)
    }

    /// Sets the destination of one channel.
    ///
    /// Returns `false` (and changes nothing) for an unknown index, a MIDI
    /// channel outside 1..=16 or a CC above 127.
    pub fn set_mapping(&mut self, index: usize, midi_channel: u8, cc: u8) -> bool {
        if !(1..=MIDI_CHANNELS).contains(&midi_channel) || cc > MAX_CC {
            return false;
        }
        match self.channels.get_mut(index) {
            Some(channel) => {
                channel.midi_channel = midi_channel;
                channel.cc = cc;
                true
            }
            None => false,
        }
    }

    /// Copies every destination from `record`.
    pub fn load_mappings(&mut self, record: &ConfigRecord) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(midi_channel) = record.output_channel(index) {
                channel.midi_channel = midi_channel;
            }
            if let Some(cc) = record.cc_number(index) {
                channel.cc = cc;
            }
        }
    }

    /// Scans every channel once, calling `on_change` for each reported change.
    ///
    /// Returns the number of changes reported.
    pub fn process_all<IO, F>(&mut self, mux: &mut Mux, io: &mut IO, mut on_change: F) -> usize
    where
        IO: AnalogIo + ?Sized,
        F: FnMut(&mut IO, ChannelChange),
    {
        let mut reported = 0;
        for channel in self.channels.iter_mut() {
            mux.select(io, channel.index);
            let mut sum: u32 = 0;
            for _ in 0..OVERSAMPLE {
                sum += u32::from(io.analog_read(POT_SENSE_PIN));
            }
            let raw = sum as f32 / f32::from(OVERSAMPLE);
            let smoothed = channel.smoother.update(raw);
            if !channel.detector.check(smoothed) {
                continue;
            }
            let value = map_to_midi(libm::roundf(smoothed) as u16);
            if channel.last_value == Some(value) {
                continue;
            }
            channel.last_value = Some(value);
            channel.dirty = true;
            reported += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(index = channel.index, value, "channel changed");

            on_change(
                io,
                ChannelChange {
                    index: channel.index,
                    midi_channel: channel.midi_channel,
                    cc: channel.cc,
                    value,
                },
            );
        }
        reported
    }

    /// Calls `f` for every dirty channel and clears its flag.
    pub fn drain_dirty(&mut self, mut f: impl FnMut(&Channel)) -> usize {
        let mut drained = 0;
        for channel in self.channels.iter_mut().filter(|c| c.dirty) {
            channel.dirty = false;
            f(channel);
            drained += 1;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec::Vec as StdVec;

    /// Pots addressed through the mux; every other pin reads 0.
    struct Pots {
        values: [u16; 64],
        bank: u8,
        slot: u8,
        reads: usize,
    }

    impl Pots {
        fn new(value: u16) -> Self {
            Self {
                values: [value; 64],
                bank: 0,
                slot: 0,
                reads: 0,
            }
        }
    }

    impl AnalogIo for Pots {
        fn analog_read(&mut self, pin: u8) -> u16 {
            self.reads += 1;
            if pin == POT_SENSE_PIN {
                self.values[usize::from(self.bank * 8 + self.slot)]
            } else {
                0
            }
        }

        fn digital_read(&mut self, _pin: u8) -> bool {
            true
        }

        fn select_mux_address(&mut self, bank_pins: &[u8], address: u8) {
            if bank_pins == crate::layout::PRIMARY_MUX_PINS {
                self.bank = address;
            } else {
                self.slot = address;
            }
        }
    }

    #[test]
    fn test_rejects_bad_count() {
        assert!(ChannelScanner::new(0).is_err());
        assert!(ChannelScanner::new(MAX_CHANNELS + 1).is_err());
        assert_eq!(ChannelScanner::new(42).unwrap().len(), 42);
    }

    #[test]
    fn test_default_mappings() {
        let scanner = ChannelScanner::new(4).unwrap();
        let channel = scanner.channel(3).unwrap();
        assert_eq!(channel.midi_channel(), 1);
        assert_eq!(channel.cc(), 3);
    }

    #[test]
    fn test_first_pass_reports_every_channel() {
        let mut scanner = ChannelScanner::new(10).unwrap();
        let mut pots = Pots::new(1023);
        let mut mux = Mux::default();
        let mut seen = StdVec::new();
        let count = scanner.process_all(&mut mux, &mut pots, |_, change| seen.push(change));
        assert_eq!(count, 10);
        assert_eq!(pots.reads, 10 * usize::from(OVERSAMPLE));
        assert!(seen.iter().all(|c| c.value == 127));
        assert_eq!(seen[9].index, 9);
    }

    #[test]
    fn test_steady_input_goes_quiet() {
        let mut scanner = ChannelScanner::new(8).unwrap();
        let mut pots = Pots::new(600);
        let mut mux = Mux::default();
        scanner.process_all(&mut mux, &mut pots, |_, _| {});
        for _ in 0..50 {
            assert_eq!(scanner.process_all(&mut mux, &mut pots, |_, _| {}), 0);
        }
    }

    #[test]
    fn test_move_reports_mapped_value() {
        let mut scanner = ChannelScanner::new(16).unwrap();
        let mut pots = Pots::new(0);
        let mut mux = Mux::default();
        scanner.process_all(&mut mux, &mut pots, |_, _| {});
        assert!(scanner.set_mapping(12, 5, 74));

        pots.values[12] = 1023;
        let mut last = None;
        for _ in 0..200 {
            scanner.process_all(&mut mux, &mut pots, |_, change| {
                assert_eq!(change.index, 12);
                assert_eq!((change.midi_channel, change.cc), (5, 74));
                last = Some(change.value);
            });
        }
        assert!(last.is_some_and(|v| v >= 126), "{last:?}");
        assert_eq!(scanner.last_value(12), last);
    }

    #[test]
    fn test_set_mapping_bounds() {
        let mut scanner = ChannelScanner::new(4).unwrap();
        assert!(!scanner.set_mapping(4, 1, 1));
        assert!(!scanner.set_mapping(0, 0, 1));
        assert!(!scanner.set_mapping(0, 17, 1));
        assert!(!scanner.set_mapping(0, 1, 128));
        assert_eq!(scanner.channel(0).unwrap().midi_channel(), 1);
    }

    #[test]
    fn test_load_mappings() {
        let mut record = ConfigRecord::defaults(4).unwrap();
        record.set_output_channel(2, 9);
        record.set_cc_number(2, 100);
        let mut scanner = ChannelScanner::new(4).unwrap();
        scanner.load_mappings(&record);
        assert_eq!(scanner.channel(2).unwrap().midi_channel(), 9);
        assert_eq!(scanner.channel(2).unwrap().cc(), 100);
    }

    #[test]
    fn test_drain_dirty() {
        let mut scanner = ChannelScanner::new(3).unwrap();
        let mut pots = Pots::new(512);
        let mut mux = Mux::default();
        scanner.process_all(&mut mux, &mut pots, |_, _| {});
        assert_eq!(scanner.drain_dirty(|c| assert!(c.last_value().is_some())), 3);
        assert_eq!(scanner.drain_dirty(|_| {}), 0);
    }
}
