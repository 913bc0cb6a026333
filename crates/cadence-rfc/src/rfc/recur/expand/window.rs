use chrono::{DateTime, Months, Utc};

use cadence_core::constants::LOOKAHEAD_YEARS;

/// A half-open `[start, end)` span of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[start, start + lookahead horizon)`.
    #[must_use]
    pub fn lookahead(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: lookahead_end(start),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Strict overlap: windows that only touch do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The furthest point an open-ended series starting at `start` is expanded to.
#[must_use]
pub fn lookahead_end(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_months(Months::new(LOOKAHEAD_YEARS * 12))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap()
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = Window::new(at(9, 0), at(11, 0));
        let b = Window::new(at(11, 0), at(13, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_overlap() {
        let a = Window::new(at(9, 0), at(11, 0));
        let b = Window::new(at(10, 30), at(12, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn containment_is_half_open() {
        let w = Window::new(at(9, 0), at(11, 0));
        assert!(w.contains(at(9, 0)));
        assert!(!w.contains(at(11, 0)));
    }

    #[test]
    fn lookahead_is_two_years() {
        let w = Window::lookahead(at(9, 0));
        assert_eq!(w.end, Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap());
    }
}
