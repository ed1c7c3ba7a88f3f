//! Second-order IIR filter used by the envelope followers.
//!
//! Coefficients follow the RBJ Audio EQ Cookbook formulas for low-pass,
//! high-pass and constant-peak band-pass responses. The filter runs in
//! Direct Form II Transposed, so the retained state is exactly two delay
//! taps.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Lowest accepted cutoff/center frequency in Hz.
pub const MIN_FREQUENCY_HZ: f32 = 20.0;

/// Highest accepted cutoff/center frequency in Hz.
pub const MAX_FREQUENCY_HZ: f32 = 20_000.0;

/// Default quality factor (Butterworth).
pub const DEFAULT_Q: f32 = 0.707;

/// Smallest accepted Q. Anything lower makes `alpha` explode.
pub const MIN_Q: f32 = 0.1;

/// Sample rate substituted when a non-positive rate is supplied.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Fraction of the sample rate the cutoff may reach before it is clamped.
const NYQUIST_MARGIN: f32 = 0.45;

/// Response shape of a [`BiquadFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Passes content below the cutoff.
    Lowpass,
    /// Passes content above the cutoff.
    Highpass,
    /// Passes content around the center frequency (0 dB peak gain).
    Bandpass,
}

/// Stateful biquad filter.
///
/// ```text
/// y[n] = b0*x[n] + z1
/// z1   = b1*x[n] - a1*y[n] + z2
/// z2   = b2*x[n] - a2*y[n]
/// ```
///
/// A freshly constructed filter passes its input through unchanged until
/// [`configure`](Self::configure) is called.
///
/// # Example
///
/// ```rust
/// use moar_core::{BiquadFilter, FilterKind};
///
/// let mut filter = BiquadFilter::new();
/// filter.configure(FilterKind::Lowpass, 1000.0, 44_100.0, 0.707);
/// let y = filter.process(64.0);
/// assert!(y < 64.0);
/// ```
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl BiquadFilter {
    /// Creates a passthrough filter.
    pub const fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Computes coefficients for `kind` at `frequency` Hz.
    ///
    /// `frequency` is clamped to [`MIN_FREQUENCY_HZ`]..[`MAX_FREQUENCY_HZ`]
    /// and additionally kept below 45% of `sample_rate`; `q` is floored at
    /// [`MIN_Q`]. Out-of-range values are never rejected.
    ///
    /// Returns `true` if `frequency` had to be clamped. Delay state is kept,
    /// so retuning a running filter does not click.
    pub fn configure(&mut self, kind: FilterKind, frequency: f32, sample_rate: f32, q: f32) -> bool {
        let sample_rate = if sample_rate > 0.0 {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };
        let upper = (sample_rate * NYQUIST_MARGIN)
            .min(MAX_FREQUENCY_HZ)
            .max(MIN_FREQUENCY_HZ);
        let clamped_frequency = if frequency.is_finite() {
            frequency.clamp(MIN_FREQUENCY_HZ, upper)
        } else {
            MIN_FREQUENCY_HZ
        };
        let q = if q.is_finite() { q.max(MIN_Q) } else { DEFAULT_Q };

        let omega = 2.0 * PI * clamped_frequency / sample_rate;
        let cos_omega = cosf(omega);
        let alpha = sinf(omega) / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => {
                let b = (1.0 - cos_omega) / 2.0;
                (b, 1.0 - cos_omega, b)
            }
            FilterKind::Highpass => {
                let b = (1.0 + cos_omega) / 2.0;
                (b, -(1.0 + cos_omega), b)
            }
            FilterKind::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0_inv = 1.0 / (1.0 + alpha);

        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = -2.0 * cos_omega * a0_inv;
        self.a2 = (1.0 - alpha) * a0_inv;

        #[cfg(feature = "tracing")]
        tracing::debug!(?kind, frequency = clamped_frequency, q, "biquad configured");

        clamped_frequency != frequency
    }

    /// Runs one sample through the difference equation.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Clears the two delay taps, keeping the coefficients.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(filter: &mut BiquadFilter, input: f32, n: usize) -> f32 {
        let mut out = 0.0;
        for _ in 0..n {
            out = filter.process(input);
        }
        out
    }

    #[test]
    fn test_passthrough_by_default() {
        let mut filter = BiquadFilter::new();
        for i in 0..10 {
            let x = i as f32 * 3.0;
            assert_eq!(filter.process(x), x);
        }
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Lowpass, 1000.0, 44_100.0, DEFAULT_Q);
        let out = settle(&mut filter, 100.0, 2000);
        assert!((out - 100.0).abs() < 0.5, "got {out}");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Highpass, 1000.0, 44_100.0, DEFAULT_Q);
        let out = settle(&mut filter, 100.0, 4000);
        assert!(out.abs() < 0.5, "got {out}");
    }

    #[test]
    fn test_bandpass_blocks_dc() {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Bandpass, 1000.0, 44_100.0, 1.0);
        let out = settle(&mut filter, 100.0, 4000);
        assert!(out.abs() < 0.5, "got {out}");
    }

    #[test]
    fn test_configure_reports_clamping() {
        let mut filter = BiquadFilter::new();
        assert!(!filter.configure(FilterKind::Lowpass, 1000.0, 44_100.0, DEFAULT_Q));
        assert!(filter.configure(FilterKind::Lowpass, 10.0, 44_100.0, DEFAULT_Q));
        assert!(filter.configure(FilterKind::Lowpass, 30_000.0, 96_000.0, DEFAULT_Q));
        assert!(filter.configure(FilterKind::Lowpass, f32::NAN, 44_100.0, DEFAULT_Q));
    }

    #[test]
    fn test_below_floor_matches_floor() {
        let mut low = BiquadFilter::new();
        let mut floor = BiquadFilter::new();
        low.configure(FilterKind::Lowpass, 10.0, 44_100.0, DEFAULT_Q);
        floor.configure(FilterKind::Lowpass, MIN_FREQUENCY_HZ, 44_100.0, DEFAULT_Q);
        for i in 0..256 {
            let x = ((i * 37) % 128) as f32;
            assert_eq!(low.process(x), floor.process(x));
        }
    }

    #[test]
    fn test_cutoff_kept_below_nyquist() {
        // 1 kHz at a 200 Hz tick rate would be unstable without the margin.
        let mut filter = BiquadFilter::new();
        assert!(filter.configure(FilterKind::Lowpass, 1000.0, 200.0, DEFAULT_Q));
        let out = settle(&mut filter, 50.0, 1000);
        assert!(out.is_finite());
        assert!((out - 50.0).abs() < 1.0, "got {out}");
    }

    #[test]
    fn test_degenerate_q_is_floored() {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Bandpass, 500.0, 44_100.0, 0.0);
        let out = settle(&mut filter, 10.0, 100);
        assert!(out.is_finite());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Lowpass, 200.0, 44_100.0, DEFAULT_Q);
        settle(&mut filter, 127.0, 50);
        filter.reset();
        assert_eq!(filter.z1, 0.0);
        assert_eq!(filter.z2, 0.0);
    }

    #[test]
    fn test_non_positive_sample_rate_uses_default() {
        let mut a = BiquadFilter::new();
        let mut b = BiquadFilter::new();
        a.configure(FilterKind::Lowpass, 1000.0, 0.0, DEFAULT_Q);
        b.configure(FilterKind::Lowpass, 1000.0, DEFAULT_SAMPLE_RATE, DEFAULT_Q);
        assert_eq!(a.process(1.0), b.process(1.0));
    }
}
