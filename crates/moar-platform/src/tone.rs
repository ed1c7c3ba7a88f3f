//! Live tone tuning from the frequency and Q pots.

use moar_core::biquad::{DEFAULT_Q, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use moar_core::{ADC_MAX, ChangeDetector, ExponentialSmoother, map_exponential};
use moar_core::smoothing::{DEFAULT_ALPHA, DEFAULT_JITTER_THRESHOLD};

use crate::AnalogIo;
use crate::envelope::{DEFAULT_CUTOFF_HZ, EnvelopeProcessor};
use crate::layout::{TONE_FREQUENCY_PIN, TONE_Q_PIN};

/// Lowest Q reachable from the pot.
pub const MIN_TONE_Q: f32 = 0.5;

/// Highest Q reachable from the pot.
pub const MAX_TONE_Q: f32 = 10.0;

/// Pot travel is cubed so the low end gets most of the resolution.
const FREQUENCY_EXPONENT: f32 = 3.0;

/// Reads the two tone pots and retunes the envelope filters on change.
#[derive(Debug, Clone)]
pub struct ToneControl {
    frequency_smoother: ExponentialSmoother,
    q_smoother: ExponentialSmoother,
    frequency_detector: ChangeDetector,
    q_detector: ChangeDetector,
    frequency: f32,
    q: f32,
}

impl ToneControl {
    /// Creates a control that has not read the pots yet.
    pub fn new() -> Self {
        Self {
            frequency_smoother: ExponentialSmoother::new(DEFAULT_ALPHA),
            q_smoother: ExponentialSmoother::new(DEFAULT_ALPHA),
            frequency_detector: ChangeDetector::new(DEFAULT_JITTER_THRESHOLD),
            q_detector: ChangeDetector::new(DEFAULT_JITTER_THRESHOLD),
            frequency: DEFAULT_CUTOFF_HZ,
            q: DEFAULT_Q,
        }
    }

    /// Current cutoff in Hz.
    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current Q.
    #[inline]
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Samples both pots. If either moved past the jitter threshold, the
    /// envelope filters are re-derived and `true` is returned.
    pub fn update<IO: AnalogIo + ?Sized>(&mut self, io: &mut IO, envelopes: &mut EnvelopeProcessor) -> bool {
        let raw_frequency = self.frequency_smoother.update(f32::from(io.analog_read(TONE_FREQUENCY_PIN)));
        let raw_q = self.q_smoother.update(f32::from(io.analog_read(TONE_Q_PIN)));

        // Both detectors must see every sample to keep their state current.
        let frequency_moved = self.frequency_detector.check(raw_frequency);
        let q_moved = self.q_detector.check(raw_q);
        if !(frequency_moved || q_moved) {
            return false;
        }

        let full_scale = f32::from(ADC_MAX);
        self.frequency = map_exponential(
            raw_frequency,
            0.0,
            full_scale,
            MIN_FREQUENCY_HZ,
            MAX_FREQUENCY_HZ,
            FREQUENCY_EXPONENT,
        );
        self.q = map_exponential(raw_q, 0.0, full_scale, MIN_TONE_Q, MAX_TONE_Q, 1.0);
        envelopes.configure_filter(self.frequency, self.q);
        true
    }
}

impl Default for ToneControl {
    fn default() -> Self {
        Self::new()
    }
}
