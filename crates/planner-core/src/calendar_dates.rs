//! Work-calendar arithmetic: weekday/holiday-aware date sequences (§4.4, §9).

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_work_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

/// An iterator over work days starting at `start`, skipping weekends and
/// `holidays`, with no upper bound (fixed-crew mode, §4.4: "open-ended").
pub struct WorkDays<'a> {
    next: NaiveDate,
    end: Option<NaiveDate>,
    holidays: &'a HashSet<NaiveDate>,
}

impl<'a> WorkDays<'a> {
    pub fn from(start: NaiveDate, holidays: &'a HashSet<NaiveDate>) -> Self {
        Self {
            next: start,
            end: None,
            holidays,
        }
    }

    pub fn bounded(start: NaiveDate, end: NaiveDate, holidays: &'a HashSet<NaiveDate>) -> Self {
        Self {
            next: start,
            end: Some(end),
            holidays,
        }
    }
}

impl<'a> Iterator for WorkDays<'a> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if let Some(end) = self.end {
                if self.next > end {
                    return None;
                }
            }
            let candidate = self.next;
            self.next += Duration::days(1);
            if is_work_day(candidate, self.holidays) {
                return Some(candidate);
            }
        }
    }
}

/// Number of work days in the inclusive range `[start, end]`.
pub fn work_day_count(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> usize {
    WorkDays::bounded(start, end, holidays).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn skips_weekends() {
        // 2025-01-01 is a Wednesday.
        let holidays = HashSet::new();
        let days: Vec<_> = WorkDays::bounded(d(2025, 1, 1), d(2025, 1, 10), &holidays).collect();
        assert!(!days.contains(&d(2025, 1, 4))); // Sat
        assert!(!days.contains(&d(2025, 1, 5))); // Sun
    }

    #[test]
    fn skips_holidays() {
        let mut holidays = HashSet::new();
        holidays.insert(d(2025, 1, 6));
        let days: Vec<_> = WorkDays::bounded(d(2025, 1, 1), d(2025, 1, 10), &holidays).collect();
        assert!(!days.contains(&d(2025, 1, 6)));
        assert!(days.contains(&d(2025, 1, 7)));
    }

    #[test]
    fn work_day_count_matches_iterator_len() {
        let holidays = HashSet::new();
        let count = work_day_count(d(2025, 1, 1), d(2025, 1, 10), &holidays);
        assert_eq!(count, WorkDays::bounded(d(2025, 1, 1), d(2025, 1, 10), &holidays).count());
    }

    #[test]
    fn unbounded_sequence_is_open_ended() {
        let holidays = HashSet::new();
        let mut days = WorkDays::from(d(2025, 1, 1), &holidays);
        for _ in 0..30 {
            assert!(days.next().is_some());
        }
    }
}
