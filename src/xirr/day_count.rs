//! Actual/365 Fixed day count

use chrono::NaiveDate;

/// Days in the Actual/365 Fixed year basis
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Year fraction from `anchor` to `date` under Actual/365 Fixed
///
/// Leap days count as ordinary days, so a calendar year containing Feb 29
/// yields 366/365. Callers guarantee `date >= anchor`; the assembler enforces
/// that for every series.
pub fn years_between(date: NaiveDate, anchor: NaiveDate) -> f64 {
    (date - anchor).num_days() as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_day_is_zero() {
        assert_eq!(years_between(date(2021, 3, 15), date(2021, 3, 15)), 0.0);
    }

    #[test]
    fn test_non_leap_year_is_exactly_one() {
        assert_eq!(years_between(date(2022, 1, 1), date(2021, 1, 1)), 1.0);
    }

    #[test]
    fn test_leap_year_exceeds_one() {
        // 2020 has 366 days
        let t = years_between(date(2021, 1, 1), date(2020, 1, 1));
        assert_eq!(t, 366.0 / 365.0);
    }

    #[test]
    fn test_half_year() {
        let t = years_between(date(2021, 7, 2), date(2021, 1, 1));
        assert_eq!(t, 182.0 / 365.0);
    }
}
