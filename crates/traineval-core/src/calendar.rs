//! Training calendar arithmetic.
//!
//! Two conventions coexist and must not be merged:
//!
//! - **Assignment** uses working days: the curriculum's `day_number` is the
//!   count of Monday–Friday dates from the training start through the
//!   assessed date ([`working_day_number`]).
//! - **Deadlines** use calendar days: a task is due `day_number - 1` calendar
//!   days after the start ([`task_due_date`]), weekends included.
//!
//! All inputs are plain dates, so there is no time-of-day or timezone drift.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Result of resolving a date against a training calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "day", rename_all = "snake_case")]
pub enum DayIndex {
    /// 1-based working-day number.
    Day(u32),
    /// The date lies before the training start.
    BeforeStart,
    /// The date is a Saturday or Sunday.
    Weekend,
}

impl DayIndex {
    /// Integer form used by older exports: the day number, `-1` before the
    /// start, `-2` on a weekend.
    pub fn code(&self) -> i64 {
        match self {
            DayIndex::Day(n) => i64::from(*n),
            DayIndex::BeforeStart => -1,
            DayIndex::Weekend => -2,
        }
    }

    pub fn day(&self) -> Option<u32> {
        match self {
            DayIndex::Day(n) => Some(*n),
            _ => None,
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Map `target` to its working-day number relative to `start`.
///
/// The start date counts as day 1 when it is a weekday.
pub fn working_day_number(start: NaiveDate, target: NaiveDate) -> DayIndex {
    if target < start {
        return DayIndex::BeforeStart;
    }
    if is_weekend(target) {
        return DayIndex::Weekend;
    }

    let working_days = start
        .iter_days()
        .take_while(|day| *day <= target)
        .filter(|day| !is_weekend(*day))
        .count();

    DayIndex::Day(working_days as u32)
}

/// Calendar due date of a task assigned on `day_number`.
///
/// This is a calendar-day offset from `start`, not a working-day offset.
pub fn task_due_date(start: NaiveDate, day_number: u32) -> NaiveDate {
    start + Duration::days(i64::from(day_number) - 1)
}

/// A completion counts as on time when it happened on or before the due date.
pub fn is_on_time(start: NaiveDate, day_number: u32, completion_date: NaiveDate) -> bool {
    completion_date <= task_due_date(start, day_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_start_is_day_one() {
        // 2024-01-01 is a Monday
        let start = date(2024, 1, 1);
        assert_eq!(working_day_number(start, start), DayIndex::Day(1));
        assert_eq!(working_day_number(start, date(2024, 1, 5)), DayIndex::Day(5));
    }

    #[test]
    fn saturday_and_sunday_are_weekend() {
        let start = date(2024, 1, 1);
        assert_eq!(working_day_number(start, date(2024, 1, 6)), DayIndex::Weekend);
        assert_eq!(working_day_number(start, date(2024, 1, 7)), DayIndex::Weekend);
    }

    #[test]
    fn weekends_are_skipped_when_counting() {
        let start = date(2024, 1, 1);
        assert_eq!(working_day_number(start, date(2024, 1, 8)), DayIndex::Day(6));
        assert_eq!(working_day_number(start, date(2024, 1, 15)), DayIndex::Day(11));
    }

    #[test]
    fn date_before_start() {
        let start = date(2024, 1, 1);
        assert_eq!(
            working_day_number(start, date(2023, 12, 29)),
            DayIndex::BeforeStart
        );
        assert_eq!(DayIndex::BeforeStart.code(), -1);
        assert_eq!(DayIndex::Weekend.code(), -2);
    }

    #[test]
    fn weekend_start_counts_from_first_weekday() {
        // 2024-01-06 is a Saturday
        let start = date(2024, 1, 6);
        assert_eq!(working_day_number(start, date(2024, 1, 8)), DayIndex::Day(1));
    }

    #[test]
    fn due_date_is_a_calendar_offset() {
        let start = date(2024, 1, 1);
        assert_eq!(task_due_date(start, 1), start);
        assert_eq!(task_due_date(start, 3), date(2024, 1, 3));
        // working day 6 is Monday 2024-01-08, but the due date is Saturday
        assert_eq!(task_due_date(start, 6), date(2024, 1, 6));
    }

    #[test]
    fn on_time_is_inclusive_of_due_date() {
        let start = date(2024, 1, 1);
        assert!(is_on_time(start, 3, date(2024, 1, 3)));
        assert!(is_on_time(start, 3, date(2024, 1, 2)));
        assert!(!is_on_time(start, 3, date(2024, 1, 4)));
    }
}
