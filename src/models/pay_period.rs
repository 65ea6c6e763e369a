//! Pay period and date range models.
//!
//! This module contains the [`PayPeriod`] type describing one calendar month
//! of payroll, and the inclusive [`DateRange`] shared by the leave ledger and
//! the loss-of-pay calculation so both agree on what a day inside a period is.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An inclusive range of calendar dates.
///
/// # Example
///
/// ```
/// use payroll_engine::models::DateRange;
/// use chrono::NaiveDate;
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
/// );
/// assert_eq!(range.days(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range from its inclusive bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of calendar days covered, counting both ends.
    ///
    /// An inverted range covers zero days.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    /// Returns true if both ranges share at least one day.
    pub fn intersects(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Returns the part of this range that falls inside `bounds`, if any.
    ///
    /// ```
    /// use payroll_engine::models::DateRange;
    /// use chrono::NaiveDate;
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
    /// let leave = DateRange::new(d(7, 30), d(8, 2));
    /// let august = DateRange::new(d(8, 1), d(8, 31));
    /// assert_eq!(leave.clip_to(&august), Some(DateRange::new(d(8, 1), d(8, 2))));
    /// ```
    pub fn clip_to(&self, bounds: &DateRange) -> Option<DateRange> {
        if !self.intersects(bounds) {
            return None;
        }
        Some(DateRange {
            start: self.start.max(bounds.start),
            end: self.end.min(bounds.end),
        })
    }
}

/// A monthly pay period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let august = PayPeriod::for_month(2025, 8).unwrap();
/// assert_eq!(august.start_date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
/// assert_eq!(august.end_date, NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
/// assert_eq!(august.days_in_month(), 31);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Calendar year of the period.
    pub year: i32,
    /// Calendar month of the period (1-12).
    pub month: u32,
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
}

impl PayPeriod {
    /// Builds the period covering the whole of `month` in `year`.
    ///
    /// Fails with [`EngineError::Validation`] for a month outside 1-12 or a
    /// year chrono cannot represent.
    pub fn for_month(year: i32, month: u32) -> EngineResult<Self> {
        let start_date =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| EngineError::Validation {
                field: "month".to_string(),
                message: format!("{}-{} is not a valid calendar month", year, month),
            })?;
        let end_date = start_date
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| EngineError::Validation {
                field: "year".to_string(),
                message: format!("{} is out of the supported date range", year),
            })?;

        Ok(Self {
            year,
            month,
            start_date,
            end_date,
        })
    }

    /// Calendar length of the month in days.
    pub fn days_in_month(&self) -> u32 {
        self.end_date.day()
    }

    /// The period as an inclusive date range.
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_august_has_31_days() {
        let period = PayPeriod::for_month(2025, 8).unwrap();
        assert_eq!(period.days_in_month(), 31);
        assert_eq!(period.end_date, date(2025, 8, 31));
    }

    #[test]
    fn test_leap_february_has_29_days() {
        let period = PayPeriod::for_month(2024, 2).unwrap();
        assert_eq!(period.days_in_month(), 29);
        assert_eq!(period.end_date, date(2024, 2, 29));
    }

    #[test]
    fn test_december_ends_on_31st() {
        let period = PayPeriod::for_month(2025, 12).unwrap();
        assert_eq!(period.end_date, date(2025, 12, 31));
    }

    #[test]
    fn test_month_13_is_rejected() {
        let err = PayPeriod::for_month(2025, 13).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_single_day_range_has_one_day() {
        let range = DateRange::new(date(2025, 8, 5), date(2025, 8, 5));
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_inverted_range_has_zero_days() {
        let range = DateRange::new(date(2025, 8, 5), date(2025, 8, 4));
        assert_eq!(range.days(), 0);
    }

    #[test]
    fn test_touching_ranges_intersect() {
        let a = DateRange::new(date(2025, 8, 1), date(2025, 8, 5));
        let b = DateRange::new(date(2025, 8, 5), date(2025, 8, 9));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_adjacent_ranges_do_not_intersect() {
        let a = DateRange::new(date(2025, 8, 1), date(2025, 8, 5));
        let b = DateRange::new(date(2025, 8, 6), date(2025, 8, 9));
        assert!(!a.intersects(&b));
        assert_eq!(a.clip_to(&b), None);
    }

    #[test]
    fn test_clip_to_keeps_inner_range() {
        let month = DateRange::new(date(2025, 8, 1), date(2025, 8, 31));
        let inner = DateRange::new(date(2025, 8, 10), date(2025, 8, 12));
        assert_eq!(inner.clip_to(&month), Some(inner));
    }

    #[test]
    fn test_clip_to_cuts_trailing_days() {
        let month = DateRange::new(date(2025, 8, 1), date(2025, 8, 31));
        let leave = DateRange::new(date(2025, 8, 30), date(2025, 9, 3));
        let clipped = leave.clip_to(&month).unwrap();
        assert_eq!(clipped, DateRange::new(date(2025, 8, 30), date(2025, 8, 31)));
        assert_eq!(clipped.days(), 2);
    }
}
