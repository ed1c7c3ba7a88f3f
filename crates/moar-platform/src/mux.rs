//! Two-level multiplexer addressing.
//!
//! A flat index `i` selects bank `i / 8` on the primary mux and slot
//! `i % 8` on the secondary. Address lines are only re-driven when their
//! value changes, saving the settle time on consecutive reads.

use crate::AnalogIo;
use crate::layout::{PRIMARY_MUX_PINS, SECONDARY_MUX_PINS};

/// Slots per mux bank.
pub const SLOTS_PER_BANK: u8 = 8;

/// Address-line state shared by everything reading through the mux tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mux {
    primary_pins: [u8; 3],
    secondary_pins: [u8; 3],
    bank: Option<u8>,
    slot: Option<u8>,
}

impl Mux {
    /// Creates a mux on the given address lines. Nothing is driven yet.
    pub const fn new(primary_pins: [u8; 3], secondary_pins: [u8; 3]) -> Self {
        Self {
            primary_pins,
            secondary_pins,
            bank: None,
            slot: None,
        }
    }

    /// Splits a flat index into `(bank, slot)`.
    #[inline]
    pub const fn split(index: u8) -> (u8, u8) {
        (index / SLOTS_PER_BANK, index % SLOTS_PER_BANK)
    }

    /// Selects `index`, driving only the address lines that change.
    ///
    /// Returns the number of banks re-driven (0, 1 or 2).
    pub fn select<IO: AnalogIo + ?Sized>(&mut self, io: &mut IO, index: u8) -> u8 {
        let (bank, slot) = Self::split(index);
        let mut driven = 0;
        if self.bank != Some(bank) {
            io.select_mux_address(&self.primary_pins, bank);
            self.bank = Some(bank);
            driven += 1;
        }
        if self.slot != Some(slot) {
            io.select_mux_address(&self.secondary_pins, slot);
            self.slot = Some(slot);
            driven += 1;
        }
        driven
    }

    /// Currently selected `(bank, slot)`, if any selection has happened.
    pub fn selected(&self) -> Option<(u8, u8)> {
        self.bank.zip(self.slot)
    }

    /// Forgets the cached selection so the next `select` drives both banks.
    pub fn invalidate(&mut self) {
        self.bank = None;
        self.slot = None;
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new(PRIMARY_MUX_PINS, SECONDARY_MUX_PINS)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Lines {
        writes: Vec<([u8; 3], u8)>,
    }

    impl AnalogIo for Lines {
        fn analog_read(&mut self, _pin: u8) -> u16 {
            0
        }

        fn digital_read(&mut self, _pin: u8) -> bool {
            true
        }

        fn select_mux_address(&mut self, bank_pins: &[u8], address: u8) {
            let mut pins = [0; 3];
            pins.copy_from_slice(bank_pins);
            self.writes.push((pins, address));
        }
    }

    #[test]
    fn test_split() {
        assert_eq!(Mux::split(0), (0, 0));
        assert_eq!(Mux::split(13), (1, 5));
        assert_eq!(Mux::split(41), (5, 1));
    }

    #[test]
    fn test_first_select_drives_both() {
        let mut mux = Mux::default();
        let mut io = Lines::default();
        assert_eq!(mux.select(&mut io, 9), 2);
        assert_eq!(io.writes, [(PRIMARY_MUX_PINS, 1), (SECONDARY_MUX_PINS, 1)]);
        assert_eq!(mux.selected(), Some((1, 1)));
    }

    #[test]
    fn test_same_bank_skips_primary() {
        let mut mux = Mux::default();
        let mut io = Lines::default();
        mux.select(&mut io, 8);
        io.writes.clear();
        assert_eq!(mux.select(&mut io, 9), 1);
        assert_eq!(io.writes, [(SECONDARY_MUX_PINS, 1)]);
        assert_eq!(mux.select(&mut io, 9), 0);
    }

    #[test]
    fn test_bank_change_keeps_slot() {
        let mut mux = Mux::default();
        let mut io = Lines::default();
        mux.select(&mut io, 3);
        io.writes.clear();
        assert_eq!(mux.select(&mut io, 11), 1);
        assert_eq!(io.writes, [(PRIMARY_MUX_PINS, 1)]);
    }

    #[test]
    fn test_invalidate() {
        let mut mux = Mux::default();
        let mut io = Lines::default();
        mux.select(&mut io, 3);
        mux.invalidate();
        assert_eq!(mux.select(&mut io, 3), 2);
    }
}
