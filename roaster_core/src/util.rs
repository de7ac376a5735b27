//! Common time/period helpers for roaster_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Minimum interval in milliseconds for work capped at `hz` per second.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Rounds up, so the cap is never exceeded (60 Hz gives 17 ms).
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    MILLIS_PER_SEC.div_ceil(u64::from(hz.max(1)))
}

/// Largest value representable in `bits` bits (`2^bits - 1`), bits clamped to 1..=31.
#[inline]
pub fn max_for_bits(bits: u8) -> u32 {
    let bits = u32::from(bits.clamp(1, 31));
    (1u32 << bits) - 1
}

/// "Skip if not elapsed" gate for periodic work.
///
/// The first call to [`RateLimiter::fire`] always passes; after that it passes
/// when at least `min_interval_ms` has elapsed since the last pass. Missed
/// intervals are never queued or caught up.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    min_interval_ms: u64,
    last_ms: Option<u64>,
}

impl RateLimiter {
    pub const fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_ms: None,
        }
    }

    pub const fn interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Whether a call to `fire(now_ms)` would pass, without recording it.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.min_interval_ms)
    }

    /// Pass and record `now_ms` as the last firing time if due.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_always_fires() {
        let mut rl = RateLimiter::new(250);
        assert!(rl.fire(0));
        assert!(!rl.fire(249));
        assert!(rl.fire(250));
    }

    #[test]
    fn reset_rearms_first_call() {
        let mut rl = RateLimiter::new(1000);
        assert!(rl.fire(5));
        assert!(!rl.fire(6));
        rl.reset();
        assert!(rl.fire(6));
    }

    #[test]
    fn bit_widths() {
        assert_eq!(max_for_bits(12), 4095);
        assert_eq!(max_for_bits(8), 255);
        assert_eq!(max_for_bits(0), 1);
    }
}
