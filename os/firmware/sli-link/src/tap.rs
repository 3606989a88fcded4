//! # Delay taps and pass windows

use core::fmt;
use sli_hw::ctrl3::PAD_DELAY_MAX;

/// One RX sampling-delay step.
///
/// Always representable in the 6-bit pad delay field.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DelayTap(u8);

impl DelayTap {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(PAD_DELAY_MAX);

    /// Checked constructor; `None` if `value` does not fit the field.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= PAD_DELAY_MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Clamp `value` into the representable range.
    #[must_use]
    pub const fn saturating(value: u8) -> Self {
        if value <= PAD_DELAY_MAX {
            Self(value)
        } else {
            Self::MAX
        }
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for DelayTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DelayTap({})", self.0)
    }
}

impl fmt::Display for DelayTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The passing taps seen during one sweep.
///
/// `first_pass` is set by the first `Suspended` sample. `last_pass` follows the
/// most recent one. Both are `None` if nothing passed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CalibrationWindow {
    pub first_pass: Option<DelayTap>,
    pub last_pass: Option<DelayTap>,
}

impl CalibrationWindow {
    pub const EMPTY: Self = Self {
        first_pass: None,
        last_pass: None,
    };

    /// Record one sample for `tap`.
    pub const fn record(&mut self, tap: DelayTap, passed: bool) {
        if passed {
            if self.first_pass.is_none() {
                self.first_pass = Some(tap);
            }
            self.last_pass = Some(tap);
        }
    }

    /// Whether a pass run has been observed.
    #[must_use]
    pub const fn has_pass(&self) -> bool {
        self.first_pass.is_some()
    }

    /// `floor((first + last) / 2)`, or `None` if nothing passed.
    #[must_use]
    pub const fn midpoint(&self) -> Option<DelayTap> {
        match (self.first_pass, self.last_pass) {
            // `last` never precedes `first`, so this cannot overflow.
            (Some(first), Some(last)) => Some(DelayTap(first.0 + (last.0 - first.0) / 2)),
            _ => None,
        }
    }

    /// Number of taps between the first and last pass, inclusive.
    #[must_use]
    pub const fn width(&self) -> u8 {
        match (self.first_pass, self.last_pass) {
            (Some(first), Some(last)) => last.0 - first.0 + 1,
            _ => 0,
        }
    }
}

impl fmt::Display for CalibrationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_pass, self.last_pass) {
            (Some(first), Some(last)) => write!(f, "[{first}, {last}]"),
            _ => f.write_str("[none]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap(v: u8) -> DelayTap {
        DelayTap::new(v).unwrap()
    }

    #[test]
    fn taps_are_bounded_by_the_field_width() {
        assert_eq!(DelayTap::new(63).map(DelayTap::get), Some(63));
        assert_eq!(DelayTap::new(64), None);
        assert_eq!(DelayTap::saturating(200), DelayTap::MAX);
    }

    #[test]
    fn window_tracks_first_and_last_pass() {
        let mut w = CalibrationWindow::EMPTY;
        w.record(tap(3), false);
        w.record(tap(4), true);
        w.record(tap(5), true);
        w.record(tap(6), true);
        assert_eq!(w.first_pass, Some(tap(4)));
        assert_eq!(w.last_pass, Some(tap(6)));
        assert_eq!(w.width(), 3);
    }

    #[test]
    fn midpoint_rounds_down() {
        let w = CalibrationWindow {
            first_pass: Some(tap(8)),
            last_pass: Some(tap(13)),
        };
        assert_eq!(w.midpoint(), Some(tap(10)));
        assert_eq!(CalibrationWindow::EMPTY.midpoint(), None);
    }
}
