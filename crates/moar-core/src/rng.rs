//! Xorshift pseudo-random generator.
//!
//! Used for the `Random` envelope curve and the randomize actions. Not
//! cryptographic; it only needs to be cheap and allocation-free.

/// 32-bit xorshift generator (Marsaglia 13/17/5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Seed used when 0 is supplied (xorshift gets stuck at zero).
    pub const DEFAULT_SEED: u32 = 0x1234_5678;

    /// Creates a generator from `seed`.
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Value in `0..bound`. Returns 0 for a zero bound.
    #[inline]
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u32() % bound
    }

    /// Value in `low..=high`.
    #[inline]
    pub fn in_range(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        low + self.below(high - low + 1)
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_is_replaced() {
        let mut rng = Xorshift32::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_in_range_inclusive() {
        let mut rng = Xorshift32::default();
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..2000 {
            let v = rng.in_range(1, 16);
            assert!((1..=16).contains(&v));
            saw_low |= v == 1;
            saw_high |= v == 16;
        }
        assert!(saw_low && saw_high);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = Xorshift32::new(99);
        let mut b = Xorshift32::new(99);
        for _ in 0..10 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
