//! Envelope extraction and output modulation.
//!
//! Each of the [`ENVELOPE_COUNT`] envelopes derives a 0-127 level once per
//! mid-tier tick while active:
//!
//! - **SEF**: one analog source, mapped to 0-127, then either run through
//!   the envelope's biquad (filter curves) or a static transfer curve.
//! - **ARG**: the two sources of the selected pair, combined with the
//!   selected [`ArgMethod`].
//!
//! Mode, ARG method and source pair are global: they are persisted as
//! single bytes and applied to every envelope at once. Curves are per
//! envelope.
//!
//! [`EnvelopeProcessor::apply_to_output`] adds a level onto a channel's
//! base value and only yields a value when it differs from the last one
//! sent for that channel.

use moar_config::{ConfigRecord, DEFAULT_ARG_PAIR, MAX_CHANNELS};
use moar_core::biquad::DEFAULT_Q;
use moar_core::{
    ArgMethod, BiquadFilter, EnvelopeMode, FilterCurve, FilterKind, Xorshift32, clamp_midi,
    map_to_midi,
};

use crate::AnalogIo;
use crate::layout::{ARG_PAIRS, ENVELOPE_COUNT, ENVELOPE_SOURCES, arg_pair_index};

/// Cutoff applied whenever a filter curve is selected.
pub const DEFAULT_CUTOFF_HZ: f32 = 1_000.0;

/// One envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeChannel {
    source: u8,
    mode: EnvelopeMode,
    curve: FilterCurve,
    arg_method: ArgMethod,
    pair: (u8, u8),
    filter: BiquadFilter,
    level: u8,
    active: bool,
}

impl EnvelopeChannel {
    fn new(source: u8, sample_rate: f32) -> Self {
        let mut filter = BiquadFilter::new();
        filter.configure(FilterKind::Lowpass, DEFAULT_CUTOFF_HZ, sample_rate, DEFAULT_Q);
        Self {
            source,
            mode: EnvelopeMode::default(),
            curve: FilterCurve::default(),
            arg_method: ArgMethod::default(),
            pair: DEFAULT_ARG_PAIR,
            filter,
            level: 0,
            active: false,
        }
    }

    /// Analog pin read in SEF mode.
    #[inline]
    pub fn source(&self) -> u8 {
        self.source
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    /// Current transfer curve.
    #[inline]
    pub fn curve(&self) -> FilterCurve {
        self.curve
    }

    /// ARG combiner.
    #[inline]
    pub fn arg_method(&self) -> ArgMethod {
        self.arg_method
    }

    /// ARG source pair, as indices into [`ENVELOPE_SOURCES`].
    #[inline]
    pub fn pair(&self) -> (u8, u8) {
        self.pair
    }

    /// Last computed level (0..=127).
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Whether `update` computes new levels.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Computes a new level from the analog sources. Inactive envelopes
    /// keep their last level.
    pub fn update<IO: AnalogIo + ?Sized>(&mut self, io: &mut IO, rng: &mut Xorshift32) -> u8 {
        if !self.active {
            return self.level;
        }
        self.level = match self.mode {
            EnvelopeMode::Sef => {
                let level = map_to_midi(io.analog_read(self.source));
                if self.curve.biquad_kind().is_some() {
                    let out = self.filter.process(f32::from(level));
                    clamp_midi(libm::roundf(out) as i32)
                } else {
                    self.curve.apply(level, rng)
                }
            }
            EnvelopeMode::Arg => {
                let a = map_to_midi(io.analog_read(source_pin(self.pair.0)));
                let b = map_to_midi(io.analog_read(source_pin(self.pair.1)));
                self.arg_method.combine(a, b)
            }
        };
        self.level
    }
}

fn source_pin(index: u8) -> u8 {
    ENVELOPE_SOURCES[usize::from(index) % ENVELOPE_COUNT]
}

/// The complete set of envelopes plus the per-channel last-sent cache.
#[derive(Debug, Clone)]
pub struct EnvelopeProcessor {
    envelopes: [EnvelopeChannel; ENVELOPE_COUNT],
    last_sent: [Option<u8>; MAX_CHANNELS],
    sample_rate: f32,
    mode: EnvelopeMode,
    arg_method: ArgMethod,
    pair: (u8, u8),
}

impl EnvelopeProcessor {
    /// Creates inactive SEF envelopes on [`ENVELOPE_SOURCES`] with linear
    /// curves and filters primed at [`DEFAULT_CUTOFF_HZ`].
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelopes: ENVELOPE_SOURCES.map(|pin| EnvelopeChannel::new(pin, sample_rate)),
            last_sent: [None; MAX_CHANNELS],
            sample_rate,
            mode: EnvelopeMode::default(),
            arg_method: ArgMethod::default(),
            pair: DEFAULT_ARG_PAIR,
        }
    }

    /// Number of envelopes.
    #[inline]
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Always false.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Envelope at `index`.
    pub fn get(&self, index: usize) -> Option<&EnvelopeChannel> {
        self.envelopes.get(index)
    }

    /// Current levels, in envelope order.
    pub fn levels(&self) -> [u8; ENVELOPE_COUNT] {
        core::array::from_fn(|i| self.envelopes[i].level)
    }

    /// Global mode.
    #[inline]
    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    /// Global ARG combiner.
    #[inline]
    pub fn arg_method(&self) -> ArgMethod {
        self.arg_method
    }

    /// Global ARG source pair.
    #[inline]
    pub fn pair(&self) -> (u8, u8) {
        self.pair
    }

    /// Updates every active envelope. Returns the number updated.
    pub fn update_all<IO: AnalogIo + ?Sized>(&mut self, io: &mut IO, rng: &mut Xorshift32) -> usize {
        let mut updated = 0;
        for envelope in self.envelopes.iter_mut().filter(|e| e.active) {
            envelope.update(io, rng);
            updated += 1;
        }
        updated
    }

    /// Adds the level of `envelope` onto `base` for output `channel`.
    ///
    /// Returns the clamped value when it differs from the last value sent
    /// for `channel`, recording it as sent. Returns `None` when nothing
    /// needs sending or the envelope is unknown or inactive.
    pub fn apply_to_output(&mut self, envelope: usize, channel: usize, base: u8) -> Option<u8> {
        let level = self.envelopes.get(envelope).filter(|e| e.active)?.level;
        let slot = self.last_sent.get_mut(channel)?;
        let value = clamp_midi(i32::from(base) + i32::from(level));
        if *slot == Some(value) {
            return None;
        }
        *slot = Some(value);
        Some(value)
    }

    /// Forgets what was sent so the next `apply_to_output` always yields.
    pub fn clear_sent(&mut self) {
        self.last_sent = [None; MAX_CHANNELS];
    }

    /// Re-derives every envelope's biquad at `frequency`/`q`.
    ///
    /// Envelopes on a static curve are configured as lowpass so the
    /// coefficients are ready if a filter curve is selected later.
    /// Returns `true` if the frequency had to be clamped.
    pub fn configure_filter(&mut self, frequency: f32, q: f32) -> bool {
        let mut clamped = false;
        for envelope in self.envelopes.iter_mut() {
            let kind = envelope.curve.biquad_kind().unwrap_or(FilterKind::Lowpass);
            clamped |= envelope.filter.configure(kind, frequency, self.sample_rate, q);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(frequency, q, clamped, "envelope filters retuned");

        clamped
    }

    /// Selects the curve of one envelope. Filter curves reset the biquad to
    /// [`DEFAULT_CUTOFF_HZ`] and [`DEFAULT_Q`].
    pub fn set_curve(&mut self, index: usize, curve: FilterCurve) -> bool {
        let sample_rate = self.sample_rate;
        let Some(envelope) = self.envelopes.get_mut(index) else {
            return false;
        };
        envelope.curve = curve;
        if let Some(kind) = curve.biquad_kind() {
            envelope.filter.configure(kind, DEFAULT_CUTOFF_HZ, sample_rate, DEFAULT_Q);
            envelope.filter.reset();
        }
        true
    }

    /// Advances one envelope to the next curve.
    pub fn cycle_curve(&mut self, index: usize) -> Option<FilterCurve> {
        let next = self.envelopes.get(index)?.curve.next();
        self.set_curve(index, next);
        Some(next)
    }

    /// Jumps one envelope between the static and the filter curve families.
    pub fn cycle_curve_family(&mut self, index: usize) -> Option<FilterCurve> {
        let current = self.envelopes.get(index)?.curve;
        let next = if current.biquad_kind().is_some() {
            FilterCurve::Linear
        } else {
            FilterCurve::Lowpass
        };
        self.set_curve(index, next);
        Some(next)
    }

    /// Sets the mode of every envelope.
    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        self.mode = mode;
        for envelope in self.envelopes.iter_mut() {
            envelope.mode = mode;
        }
    }

    /// Flips SEF/ARG and returns the new mode.
    pub fn toggle_mode(&mut self) -> EnvelopeMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Sets the ARG combiner of every envelope.
    pub fn set_arg_method(&mut self, method: ArgMethod) {
        self.arg_method = method;
        for envelope in self.envelopes.iter_mut() {
            envelope.arg_method = method;
        }
    }

    /// Advances to the next ARG combiner.
    pub fn cycle_arg_method(&mut self) -> ArgMethod {
        self.set_arg_method(self.arg_method.next());
        self.arg_method
    }

    /// Selects an ARG source pair. Only pairs from [`ARG_PAIRS`] are accepted.
    pub fn set_pair(&mut self, pair: (u8, u8)) -> bool {
        if arg_pair_index(pair).is_none() {
            return false;
        }
        self.pair = pair;
        for envelope in self.envelopes.iter_mut() {
            envelope.pair = pair;
        }
        true
    }

    /// Advances to the next pair in [`ARG_PAIRS`].
    pub fn cycle_pair(&mut self) -> (u8, u8) {
        let next = arg_pair_index(self.pair).map_or(0, |i| (i + 1) % ARG_PAIRS.len());
        self.set_pair(ARG_PAIRS[next]);
        self.pair
    }

    /// Activates or deactivates every envelope.
    pub fn set_active_all(&mut self, active: bool) {
        for envelope in self.envelopes.iter_mut() {
            envelope.active = active;
            if !active {
                envelope.level = 0;
                envelope.filter.reset();
            }
        }
    }

    /// Applies curves, mode, combiner and pair from `record`.
    ///
    /// A persisted pair outside [`ARG_PAIRS`] is ignored.
    pub fn load_from(&mut self, record: &ConfigRecord) {
        for index in 0..self.envelopes.len() {
            if let Some(curve) = record.curve(index) {
                self.set_curve(index, curve);
            }
        }
        self.set_mode(record.mode());
        self.set_arg_method(record.arg_method());
        if !self.set_pair(record.arg_pair()) {
            #[cfg(feature = "tracing")]
            tracing::warn!(pair = ?record.arg_pair(), "persisted ARG pair not selectable, keeping current");
        }
    }

    /// Writes curves, mode, combiner and pair into `record`.
    pub fn store_into(&self, record: &mut ConfigRecord) {
        for (index, envelope) in self.envelopes.iter().enumerate() {
            record.set_curve(index, envelope.curve);
        }
        record.set_mode(self.mode);
        record.set_arg_method(self.arg_method);
        record.set_arg_pair(self.pair.0, self.pair.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moar_core::biquad::DEFAULT_SAMPLE_RATE;

    /// Fixed reading per analog pin.
    struct Sources([u16; 32]);

    impl AnalogIo for Sources {
        fn analog_read(&mut self, pin: u8) -> u16 {
            self.0[usize::from(pin)]
        }

        fn digital_read(&mut self, _pin: u8) -> bool {
            true
        }

        fn select_mux_address(&mut self, _bank_pins: &[u8], _address: u8) {}
    }

    fn sources(levels: [(usize, u16); 2]) -> Sources {
        let mut pins = [0; 32];
        for (index, raw) in levels {
            pins[usize::from(ENVELOPE_SOURCES[index])] = raw;
        }
        Sources(pins)
    }

    fn processor() -> EnvelopeProcessor {
        let mut envelopes = EnvelopeProcessor::new(DEFAULT_SAMPLE_RATE);
        envelopes.set_active_all(true);
        envelopes
    }

    #[test]
    fn test_inactive_envelopes_do_nothing() {
        let mut envelopes = EnvelopeProcessor::new(DEFAULT_SAMPLE_RATE);
        let mut io = sources([(0, 1023), (1, 1023)]);
        assert_eq!(envelopes.update_all(&mut io, &mut Xorshift32::default()), 0);
        assert_eq!(envelopes.levels(), [0; ENVELOPE_COUNT]);
        assert_eq!(envelopes.apply_to_output(0, 0, 10), None);
    }

    #[test]
    fn test_sef_static_curves() {
        let mut envelopes = processor();
        let mut io = sources([(0, 1023), (1, 0)]);
        let mut rng = Xorshift32::default();
        envelopes.update_all(&mut io, &mut rng);
        assert_eq!(envelopes.levels()[0], 127);
        assert_eq!(envelopes.levels()[1], 0);

        envelopes.set_curve(0, FilterCurve::OppositeLinear);
        envelopes.set_curve(1, FilterCurve::OppositeLinear);
        envelopes.update_all(&mut io, &mut rng);
        assert_eq!(envelopes.levels()[0], 0);
        assert_eq!(envelopes.levels()[1], 127);
    }

    #[test]
    fn test_arg_levels_match_method() {
        // Pair (1, 2): A = 100, B = 30 after mapping.
        let mut envelopes = processor();
        let mut io = sources([(1, 806), (2, 242)]);
        let mut rng = Xorshift32::default();
        envelopes.set_mode(EnvelopeMode::Arg);
        for (method, expected) in [
            (ArgMethod::Plus, 127),
            (ArgMethod::Min, 70),
            (ArgMethod::Peck, 0),
            (ArgMethod::Sqar, 104),
            (ArgMethod::Babs, 3),
        ] {
            envelopes.set_arg_method(method);
            envelopes.update_all(&mut io, &mut rng);
            assert!(envelopes.levels().iter().all(|&l| l == expected), "{method:?}");
        }
    }

    #[test]
    fn test_lowpass_settles_on_steady_source() {
        let mut envelopes = processor();
        envelopes.set_curve(0, FilterCurve::Lowpass);
        let mut io = sources([(0, 806), (1, 0)]);
        let mut rng = Xorshift32::default();
        for _ in 0..2000 {
            envelopes.update_all(&mut io, &mut rng);
        }
        assert!(envelopes.levels()[0].abs_diff(100) <= 1);
    }

    #[test]
    fn test_apply_to_output_suppresses_repeats() {
        let mut envelopes = processor();
        let mut io = sources([(0, 403), (1, 0)]);
        envelopes.update_all(&mut io, &mut Xorshift32::default());
        let level = envelopes.levels()[0];
        assert_eq!(level, 50);

        assert_eq!(envelopes.apply_to_output(0, 7, 20), Some(70));
        assert_eq!(envelopes.apply_to_output(0, 7, 20), None);
        assert_eq!(envelopes.apply_to_output(0, 8, 20), Some(70));
        assert_eq!(envelopes.apply_to_output(0, 7, 100), Some(127));
        assert_eq!(envelopes.apply_to_output(0, MAX_CHANNELS, 1), None);
        envelopes.clear_sent();
        assert_eq!(envelopes.apply_to_output(0, 7, 100), Some(127));
    }

    #[test]
    fn test_mode_method_pair_are_global() {
        let mut envelopes = processor();
        assert_eq!(envelopes.toggle_mode(), EnvelopeMode::Arg);
        assert_eq!(envelopes.cycle_arg_method(), ArgMethod::Min);
        assert_eq!(envelopes.cycle_pair(), ARG_PAIRS[1]);
        for index in 0..envelopes.len() {
            let envelope = envelopes.get(index).unwrap();
            assert_eq!(envelope.mode(), EnvelopeMode::Arg);
            assert_eq!(envelope.arg_method(), ArgMethod::Min);
            assert_eq!(envelope.pair(), ARG_PAIRS[1]);
        }
    }

    #[test]
    fn test_pair_cycle_wraps_and_rejects_unknown() {
        let mut envelopes = processor();
        for _ in 0..ARG_PAIRS.len() {
            envelopes.cycle_pair();
        }
        assert_eq!(envelopes.pair(), ARG_PAIRS[0]);
        assert!(!envelopes.set_pair((0, 1)));
        assert!(!envelopes.set_pair((3, 3)));
        assert_eq!(envelopes.pair(), ARG_PAIRS[0]);
    }

    #[test]
    fn test_curve_family_switch() {
        let mut envelopes = processor();
        assert_eq!(envelopes.cycle_curve_family(2), Some(FilterCurve::Lowpass));
        assert_eq!(envelopes.cycle_curve(2), Some(FilterCurve::Highpass));
        assert_eq!(envelopes.cycle_curve_family(2), Some(FilterCurve::Linear));
        assert_eq!(envelopes.cycle_curve(ENVELOPE_COUNT), None);
    }

    #[test]
    fn test_configure_filter_reports_clamp() {
        let mut envelopes = processor();
        assert!(!envelopes.configure_filter(2_000.0, 1.0));
        assert!(envelopes.configure_filter(5.0, 1.0));
    }

    #[test]
    fn test_record_round_trip() {
        let mut envelopes = processor();
        envelopes.set_curve(4, FilterCurve::Bandpass);
        envelopes.set_mode(EnvelopeMode::Arg);
        envelopes.set_arg_method(ArgMethod::Tabs);
        envelopes.set_pair((3, 5));

        let mut record = ConfigRecord::defaults(8).unwrap();
        envelopes.store_into(&mut record);
        let mut restored = EnvelopeProcessor::new(DEFAULT_SAMPLE_RATE);
        restored.load_from(&record);
        assert_eq!(restored.get(4).unwrap().curve(), FilterCurve::Bandpass);
        assert_eq!(restored.mode(), EnvelopeMode::Arg);
        assert_eq!(restored.arg_method(), ArgMethod::Tabs);
        assert_eq!(restored.pair(), (3, 5));
    }
}
