//! Manual-advance edge detection over a debounced press counter.

use roaster_traits::PressCounter;

/// Fires once for every observed change of the press counter.
///
/// The first poll only records the baseline, so presses made before the
/// controller started are ignored. Several presses between two polls count
/// as one advance.
pub struct AdvanceButton {
    counter: Box<dyn PressCounter>,
    last_count: Option<u32>,
}

impl core::fmt::Debug for AdvanceButton {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdvanceButton")
            .field("last_count", &self.last_count)
            .finish_non_exhaustive()
    }
}

impl AdvanceButton {
    pub fn new(counter: Box<dyn PressCounter>) -> Self {
        Self {
            counter,
            last_count: None,
        }
    }

    pub fn poll(&mut self) -> bool {
        let count = self.counter.count();
        match self.last_count.replace(count) {
            Some(prev) => prev != count,
            None => false,
        }
    }

    /// Current raw press count.
    pub fn count(&mut self) -> u32 {
        self.counter.count()
    }
}
