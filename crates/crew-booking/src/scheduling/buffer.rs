//! Buffer padding and the overlap predicate used for every conflict check.

use chrono::{Duration, NaiveTime};

/// Window of a booking widened by the mandatory break on both sides.
///
/// Time arithmetic wraps within a single day; working hours keep real bookings far enough from
/// midnight that wrapping never happens in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PaddedWindow {
    pub fn around(start: NaiveTime, end: NaiveTime, break_minutes: u32) -> Self {
        let buffer = Duration::minutes(i64::from(break_minutes));
        let (padded_start, _) = start.overflowing_sub_signed(buffer);
        let (padded_end, _) = end.overflowing_add_signed(buffer);
        Self {
            start: padded_start,
            end: padded_end,
        }
    }

    /// True when an existing booking `[start, end)` falls inside this padded window.
    pub fn conflicts_with(&self, start: NaiveTime, end: NaiveTime) -> bool {
        intervals_conflict((self.start, self.end), (start, end))
    }
}

/// `a.start < b.end && a.end > b.start`; touching endpoints do not conflict.
pub fn intervals_conflict(a: (NaiveTime, NaiveTime), b: (NaiveTime, NaiveTime)) -> bool {
    a.0 < b.1 && a.1 > b.0
}

const MINUTES_PER_DAY: i64 = 24 * 60;

/// End time of a booking starting at `start` lasting `duration_minutes`, wrapping within the day.
pub fn end_after(start: NaiveTime, duration_minutes: i64) -> NaiveTime {
    let within_day = duration_minutes.rem_euclid(MINUTES_PER_DAY);
    let (end, _) = start.overflowing_add_signed(Duration::minutes(within_day));
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    #[test]
    fn pads_both_sides_by_break() {
        let window = PaddedWindow::around(at(10, 0), at(12, 0), 30);
        assert_eq!(window.start, at(9, 30));
        assert_eq!(window.end, at(12, 30));
    }

    #[test]
    fn buffer_creates_conflict_for_adjacent_bookings() {
        let requested = PaddedWindow::around(at(12, 0), at(13, 0), 30);
        assert!(requested.conflicts_with(at(10, 0), at(12, 0)));
        assert!(requested.conflicts_with(at(13, 15), at(14, 0)));
    }

    #[test]
    fn bookings_exactly_one_buffer_apart_do_not_conflict() {
        let requested = PaddedWindow::around(at(12, 30), at(13, 0), 30);
        assert!(!requested.conflicts_with(at(10, 0), at(12, 0)));
        assert!(!requested.conflicts_with(at(13, 30), at(15, 0)));
    }

    #[test]
    fn end_after_adds_minutes() {
        assert_eq!(end_after(at(10, 0), 150), at(12, 30));
    }

    #[test]
    fn end_after_wraps_extreme_durations_within_the_day() {
        assert_eq!(end_after(at(10, 0), 24 * 60 + 30), at(10, 30));
        assert_eq!(end_after(at(10, 0), -60), at(9, 0));
        assert_eq!(end_after(at(10, 0), i64::MAX), end_after(at(10, 0), i64::MAX % (24 * 60)));
        let _ = end_after(at(10, 0), i64::MIN);
    }
}
