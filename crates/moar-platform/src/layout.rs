//! Compile-time device layout.
//!
//! Pin numbers follow the Teensy 4.x numbering (`A0` = 14).

pub use moar_config::ENVELOPE_COUNT;

/// Analog channels (pots) behind the multiplexer tree.
pub const CHANNEL_COUNT: usize = 42;

/// Addressable slots in the two-level mux tree (8 banks of 8).
pub const MUX_ADDRESSES: usize = 64;

/// Address lines of the primary (bank) multiplexer.
pub const PRIMARY_MUX_PINS: [u8; 3] = [7, 8, 9];

/// Address lines of the secondary (slot) multiplexer.
pub const SECONDARY_MUX_PINS: [u8; 3] = [10, 11, 12];

/// Common output of the pot multiplexer (`A8`).
pub const POT_SENSE_PIN: u8 = 22;

/// Common output of the button multiplexer (`A9`).
pub const BUTTON_SENSE_PIN: u8 = 23;

/// Muxed buttons, one per channel.
pub const VIRTUAL_BUTTONS: usize = CHANNEL_COUNT;

/// Direct-wired, active-low control buttons.
pub const CONTROL_PINS: [u8; 6] = [2, 3, 4, 5, 6, 13];

/// Number of control buttons.
pub const CONTROL_BUTTONS: usize = CONTROL_PINS.len();

/// Total inputs handled by the gesture manager.
pub const INPUT_COUNT: usize = VIRTUAL_BUTTONS + CONTROL_BUTTONS;

/// Muxed button readings below this are a press.
pub const BUTTON_THRESHOLD: u16 = 512;

/// Analog reads averaged per pot sample.
pub const OVERSAMPLE: u16 = 4;

/// Envelope input pins: `A0`, `A1`, `A2`, `A3`, `A6`, `A7`.
pub const ENVELOPE_SOURCES: [u8; ENVELOPE_COUNT] = [14, 15, 16, 17, 20, 21];

/// Candidate ARG source pairs as indices into [`ENVELOPE_SOURCES`],
/// in cycling order (`A1`/`A2` first, `A6`/`A7` last).
pub const ARG_PAIRS: [(u8, u8); 10] = [
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (2, 3),
    (2, 4),
    (2, 5),
    (3, 4),
    (3, 5),
    (4, 5),
];

/// Tone-tuning frequency pot (`A10`).
pub const TONE_FREQUENCY_PIN: u8 = 24;

/// Tone-tuning Q pot (`A11`).
pub const TONE_Q_PIN: u8 = 25;

/// Emulated EEPROM size in bytes.
pub const NV_CAPACITY: usize = 1080;

/// Position of a source pair in [`ARG_PAIRS`].
pub fn arg_pair_index(pair: (u8, u8)) -> Option<usize> {
    ARG_PAIRS.iter().position(|&p| p == pair)
}
