//! Monotonic millisecond time base.
//!
//! The control loop reads a free-running `u32` millisecond counter that wraps
//! after ~49.7 days. All interval arithmetic goes through [`elapsed`], which
//! is wrap-safe as long as the measured interval itself is shorter than the
//! wrap period.

/// Milliseconds since boot (wrapping).
pub type Millis = u32;

/// Milliseconds elapsed from `since` to `now`, tolerant of counter wrap.
#[inline]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}
