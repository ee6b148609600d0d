//! Draw calendar.
//!
//! Block timestamps are milliseconds since the Unix epoch; the draw may only
//! start on the 7th, 17th or 27th of a month (UTC, proleptic Gregorian).

use chrono::{DateTime, Datelike};

use crate::constants::DRAW_DAYS;

/// UTC day of month for a block timestamp, `None` outside chrono's range.
pub fn day_of_month(timestamp_ms: u64) -> Option<u32> {
    let secs = i64::try_from(timestamp_ms / 1_000).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.day())
}

pub fn is_draw_day(timestamp_ms: u64) -> bool {
    day_of_month(timestamp_ms).is_some_and(|day| DRAW_DAYS.contains(&day))
}

/// The first permitted day on or after `timestamp_ms`; past the 27th this
/// wraps to the 7th of the following month.
pub fn next_draw_day(timestamp_ms: u64) -> Option<u32> {
    let today = day_of_month(timestamp_ms)?;
    DRAW_DAYS
        .iter()
        .copied()
        .find(|d| *d >= today)
        .or_else(|| DRAW_DAYS.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_07: u64 = 1_704_585_600_000;
    const JAN_08: u64 = 1_704_672_000_000;
    const JAN_17_LAST_SECOND: u64 = 1_705_535_999_000;
    const FEB_27: u64 = 1_708_992_000_000;
    const FEB_28: u64 = 1_709_078_400_000;

    #[test]
    fn permitted_days() {
        assert!(is_draw_day(JAN_07));
        assert!(is_draw_day(JAN_17_LAST_SECOND));
        assert!(is_draw_day(FEB_27));
        assert!(!is_draw_day(JAN_08));
        assert!(!is_draw_day(FEB_28));
    }

    #[test]
    fn day_of_month_is_gregorian() {
        assert_eq!(day_of_month(0), Some(1));
        assert_eq!(day_of_month(JAN_08), Some(8));
        assert_eq!(day_of_month(FEB_28 + 999), Some(28));
    }

    #[test]
    fn next_day_wraps_after_27th() {
        assert_eq!(next_draw_day(JAN_07), Some(7));
        assert_eq!(next_draw_day(JAN_08), Some(17));
        assert_eq!(next_draw_day(FEB_28), Some(7));
    }
}
