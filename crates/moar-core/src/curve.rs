//! Envelope transfer curves and the dual-source ARG combiner.
//!
//! Levels are 7-bit (0..=127) throughout. Every enum here has a stable byte
//! encoding because the selection is persisted to non-volatile storage.

use crate::biquad::FilterKind;
use crate::math::clamp_midi;
use crate::rng::Xorshift32;
use libm::{roundf, sqrtf};

/// How an envelope derives its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvelopeMode {
    /// Single-source envelope follower.
    #[default]
    Sef,
    /// Arithmetic combination of two sources.
    Arg,
}

impl EnvelopeMode {
    /// Storage byte.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Sef => 0,
            Self::Arg => 1,
        }
    }

    /// Decodes a storage byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Sef),
            1 => Some(Self::Arg),
            _ => None,
        }
    }

    /// The other mode.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Sef => Self::Arg,
            Self::Arg => Self::Sef,
        }
    }

    /// Short label for status messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sef => "SEF",
            Self::Arg => "ARG",
        }
    }
}

/// Shaping applied to a single-source level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterCurve {
    /// Identity.
    #[default]
    Linear,
    /// `127 - level`.
    OppositeLinear,
    /// `(level / 127)^2 * 127`.
    Exponential,
    /// Uniform random in `0..=level`.
    Random,
    /// Biquad low-pass.
    Lowpass,
    /// Biquad high-pass.
    Highpass,
    /// Biquad band-pass.
    Bandpass,
}

impl FilterCurve {
    /// All curves in cycling order.
    pub const ALL: [Self; 7] = [
        Self::Linear,
        Self::OppositeLinear,
        Self::Exponential,
        Self::Random,
        Self::Lowpass,
        Self::Highpass,
        Self::Bandpass,
    ];

    /// Storage byte.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Decodes a storage byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if (byte as usize) < Self::ALL.len() {
            Some(Self::ALL[byte as usize])
        } else {
            None
        }
    }

    /// Next curve, wrapping.
    pub const fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Biquad response for the filter curves, `None` for static curves.
    pub const fn biquad_kind(self) -> Option<FilterKind> {
        match self {
            Self::Lowpass => Some(FilterKind::Lowpass),
            Self::Highpass => Some(FilterKind::Highpass),
            Self::Bandpass => Some(FilterKind::Bandpass),
            _ => None,
        }
    }

    /// Applies a static curve. Filter curves return the level unchanged;
    /// the caller runs those through its biquad instead.
    pub fn apply(self, level: u8, rng: &mut Xorshift32) -> u8 {
        let level = level.min(127);
        match self {
            Self::Linear => level,
            Self::OppositeLinear => 127 - level,
            Self::Exponential => {
                let n = f32::from(level) / 127.0;
                (n * n * 127.0) as u8
            }
            Self::Random => rng.below(u32::from(level) + 1) as u8,
            Self::Lowpass | Self::Highpass | Self::Bandpass => level,
        }
    }

    /// Short label for status messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::OppositeLinear => "OPPOSITE",
            Self::Exponential => "EXP",
            Self::Random => "RAND",
            Self::Lowpass => "LOWPASS",
            Self::Highpass => "HIGHPASS",
            Self::Bandpass => "BANDPASS",
        }
    }
}

/// Arithmetic used to combine sources A and B in ARG mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgMethod {
    /// `A + B`
    #[default]
    Plus,
    /// `A - B`
    Min,
    /// `B - A`
    Peck,
    /// `(A - B) / 10`
    Shav,
    /// `round(sqrt(A^2 + B^2))`
    Sqar,
    /// `A / |B|`, 0 when B is 0
    Babs,
    /// `10 * A / |B|`, 0 when B is 0
    Tabs,
}

impl ArgMethod {
    /// All methods in cycling order.
    pub const ALL: [Self; 7] = [
        Self::Plus,
        Self::Min,
        Self::Peck,
        Self::Shav,
        Self::Sqar,
        Self::Babs,
        Self::Tabs,
    ];

    /// Storage byte.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Decodes a storage byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if (byte as usize) < Self::ALL.len() {
            Some(Self::ALL[byte as usize])
        } else {
            None
        }
    }

    /// Next method, wrapping.
    pub const fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Combines two 7-bit levels; the result is clamped to 0..=127.
    ///
    /// ```rust
    /// use moar_core::ArgMethod;
    ///
    /// assert_eq!(ArgMethod::Plus.combine(100, 30), 127);
    /// assert_eq!(ArgMethod::Sqar.combine(100, 30), 104);
    /// assert_eq!(ArgMethod::Babs.combine(100, 0), 0);
    /// ```
    pub fn combine(self, a: u8, b: u8) -> u8 {
        let a = i32::from(a);
        let b = i32::from(b);
        let value = match self {
            Self::Plus => a + b,
            Self::Min => a - b,
            Self::Peck => b - a,
            Self::Shav => (a - b) / 10,
            Self::Sqar => roundf(sqrtf((a * a + b * b) as f32)) as i32,
            Self::Babs => {
                if b == 0 {
                    0
                } else {
                    a / b.abs()
                }
            }
            Self::Tabs => {
                if b == 0 {
                    0
                } else {
                    10 * a / b.abs()
                }
            }
        };
        clamp_midi(value)
    }

    /// Short label for status messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plus => "PLUS",
            Self::Min => "MIN",
            Self::Peck => "PECK",
            Self::Shav => "SHAV",
            Self::Sqar => "SQAR",
            Self::Babs => "BABS",
            Self::Tabs => "TABS",
        }
    }
}
