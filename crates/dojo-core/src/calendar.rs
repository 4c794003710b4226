//! # Calendar Arithmetic
//!
//! Whole-month and whole-year differences used by the grade gates.
//! Integer only; a difference never goes negative.

use crate::DojoError;
use chrono::{Datelike, Months, NaiveDate};

/// Number of complete calendar months from `from` to `to`.
///
/// A month counts once the day-of-month of `from` has been reached again,
/// so 2024-01-15 → 2024-03-14 is one month and → 2024-03-15 is two.
/// When the target month is too short for that day, its last day counts:
/// 2024-01-31 → 2024-02-29 is one month. This is the largest `n` with
/// `add_months(from, n) <= to`.
/// Returns 0 when `to` is not after `from`.
#[must_use]
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() && !is_last_day_of_month(to) {
        months -= 1;
    }
    months.max(0) as u32
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().is_none_or(|next| next.month() != date.month())
}

/// Age in completed years of someone born on `birth` at date `at`.
#[must_use]
pub fn years_between(birth: NaiveDate, at: NaiveDate) -> u32 {
    if at <= birth {
        return 0;
    }
    let mut years = at.year() - birth.year();
    if (at.month(), at.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Shift `date` forward by `months`, clamping to the end of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, DojoError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| DojoError::InvalidDate(format!("{} + {} months overflows", date, months)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn months_count_on_day_of_month() {
        assert_eq!(whole_months_between(day(2024, 1, 15), day(2024, 3, 14)), 1);
        assert_eq!(whole_months_between(day(2024, 1, 15), day(2024, 3, 15)), 2);
        assert_eq!(whole_months_between(day(2023, 11, 30), day(2024, 2, 1)), 2);
    }

    #[test]
    fn month_end_counts_when_target_month_is_shorter() {
        assert_eq!(whole_months_between(day(2024, 1, 31), day(2024, 2, 29)), 1);
        assert_eq!(whole_months_between(day(2024, 1, 31), day(2024, 2, 28)), 0);
        assert_eq!(whole_months_between(day(2023, 1, 30), day(2023, 2, 28)), 1);
        assert_eq!(whole_months_between(day(2024, 3, 31), day(2024, 4, 30)), 1);
        assert_eq!(whole_months_between(day(2024, 3, 31), day(2024, 4, 29)), 0);
    }

    #[test]
    fn months_agree_with_add_months() {
        let start = day(2023, 12, 1);
        for offset in 0..120 {
            let from = start + chrono::Duration::days(offset);
            for n in 0..14 {
                let shifted = add_months(from, n).expect("shift");
                assert_eq!(whole_months_between(from, shifted), n, "{} + {}", from, n);
                if n > 0 {
                    let before = shifted.pred_opt().expect("pred");
                    assert_eq!(whole_months_between(from, before), n - 1, "{} + {} - 1d", from, n);
                }
            }
        }
    }

    #[test]
    fn months_never_negative() {
        assert_eq!(whole_months_between(day(2024, 5, 1), day(2024, 4, 1)), 0);
        assert_eq!(whole_months_between(day(2024, 5, 1), day(2024, 5, 1)), 0);
        assert_eq!(whole_months_between(day(2024, 5, 10), day(2024, 5, 31)), 0);
    }

    #[test]
    fn years_respect_birthday() {
        let birth = day(2016, 6, 20);
        assert_eq!(years_between(birth, day(2023, 6, 19)), 6);
        assert_eq!(years_between(birth, day(2023, 6, 20)), 7);
        assert_eq!(years_between(birth, day(2010, 1, 1)), 0);
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(add_months(day(2024, 12, 31), 2).expect("shift"), day(2025, 2, 28));
        assert_eq!(add_months(day(2024, 3, 10), 2).expect("shift"), day(2024, 5, 10));
    }
}
