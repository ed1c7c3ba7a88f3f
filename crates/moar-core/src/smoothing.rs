//! Analog read conditioning: exponential smoothing plus change hysteresis.
//!
//! Pots are noisy. [`ExponentialSmoother`] low-passes the raw reading and
//! [`ChangeDetector`] only reports a new value once it has moved more than
//! a fixed jitter threshold away from the last reported one. Together they
//! keep a resting pot from flooding the output with control messages.

use libm::fabsf;

/// Default smoothing factor. Smaller is smoother and slower.
pub const DEFAULT_ALPHA: f32 = 0.1;

/// Default reporting threshold in raw ADC counts (10-bit scale).
pub const DEFAULT_JITTER_THRESHOLD: f32 = 2.0;

/// Exponential moving average.
///
/// ```text
/// smoothed = alpha * raw + (1 - alpha) * smoothed_prev
/// ```
///
/// The first sample primes the average so a freshly booted channel does not
/// ramp up from zero.
///
/// # Example
///
/// ```rust
/// use moar_core::ExponentialSmoother;
///
/// let mut ema = ExponentialSmoother::new(0.1);
/// assert_eq!(ema.update(500.0), 500.0);
/// assert!((ema.update(600.0) - 510.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    alpha: f32,
    value: Option<f32>,
}

impl ExponentialSmoother {
    /// Creates an unprimed smoother. `alpha` is clamped to (0, 1].
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f32::EPSILON, 1.0)
        } else {
            DEFAULT_ALPHA
        };
        Self { alpha, value: None }
    }

    /// Folds in one raw sample and returns the smoothed value.
    #[inline]
    pub fn update(&mut self, raw: f32) -> f32 {
        let next = match self.value {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, if primed.
    #[inline]
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// Smoothing factor in use.
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Forgets the running average; the next sample primes it again.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

/// Hysteresis gate on a smoothed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeDetector {
    threshold: f32,
    last_reported: Option<f32>,
}

impl ChangeDetector {
    /// Creates a detector that has never reported.
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_reported: None,
        }
    }

    /// Returns `true` (and records `value`) if it differs from the last
    /// reported value by more than the threshold. The first call always
    /// reports.
    pub fn check(&mut self, value: f32) -> bool {
        let changed = match self.last_reported {
            Some(last) => fabsf(value - last) > self.threshold,
            None => true,
        };
        if changed {
            self.last_reported = Some(value);
        }
        changed
    }

    /// Last reported value.
    #[inline]
    pub fn last_reported(&self) -> Option<f32> {
        self.last_reported
    }

    /// Forces the next `check` to report.
    pub fn reset(&mut self) {
        self.last_reported = None;
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_THRESHOLD)
    }
}
