use std::fmt;

/// Roast phases in sequence order.
///
/// Automatic transitions only move forward; manual advance wraps
/// `Done -> Ready` through [`RoastPhase::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum RoastPhase {
    #[default]
    Ready = 0,
    Preheat,
    Tare,
    Load,
    Calibrate,
    Roast,
    Drop,
    Done,
}

impl RoastPhase {
    /// Number of phases; manual advance is `(index + 1) % COUNT`.
    pub const COUNT: u8 = 8;

    pub const ALL: [Self; Self::COUNT as usize] = [
        Self::Ready,
        Self::Preheat,
        Self::Tare,
        Self::Load,
        Self::Calibrate,
        Self::Roast,
        Self::Drop,
        Self::Done,
    ];

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index % Self::COUNT) as usize]
    }

    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Short label used in telemetry and on the display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "prep",
            Self::Preheat => "heat",
            Self::Tare => "tare",
            Self::Load => "load",
            Self::Calibrate => "cal.",
            Self::Roast => "cook",
            Self::Drop => "drop",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RoastPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_done_to_ready() {
        assert_eq!(RoastPhase::Done.next(), RoastPhase::Ready);
        assert_eq!(RoastPhase::Ready.next(), RoastPhase::Preheat);
    }

    #[test]
    fn indices_round_trip_through_all() {
        for (i, p) in RoastPhase::ALL.iter().enumerate() {
            assert_eq!(usize::from(p.index()), i);
            assert_eq!(RoastPhase::from_index(p.index()), *p);
        }
    }
}
