use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock shared by the control loop, the sensor channels and the
/// simulated rig.
///
/// - now(): monotonic Instant
/// - sleep(): wait for the given duration (implementations may simulate)
/// - ms_since(): elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let ms = self.now().saturating_duration_since(epoch).as_millis();
        ms.min(u128::from(u64::MAX)) as u64
    }
}

/// Real-time clock backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic clock for tests: `now() = origin + offset_ms`.
    ///
    /// `sleep(d)` advances the offset instead of blocking, so a control loop
    /// driven by this clock runs as fast as the test can call it. Clones share
    /// the same offset.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset_us: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset_us: Arc::new(AtomicU64::new(0)),
            }
        }

        /// The Instant corresponding to offset zero.
        pub fn origin(&self) -> Instant {
            self.origin
        }

        pub fn advance(&self, d: Duration) {
            let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
            self.offset_us.fetch_add(us, Ordering::Relaxed);
        }

        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }

        /// Jump to an absolute offset (ms) from the origin.
        pub fn set_ms(&self, ms: u64) {
            self.offset_us
                .store(ms.saturating_mul(1_000), Ordering::Relaxed);
        }

        pub fn elapsed_ms(&self) -> u64 {
            self.offset_us.load(Ordering::Relaxed) / 1_000
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + Duration::from_micros(self.offset_us.load(Ordering::Relaxed))
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
