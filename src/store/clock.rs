//! Clock abstraction for timestamps and pay dates.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
///
/// # Example
///
/// ```
/// use payroll_engine::store::{Clock, FixedClock};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
/// let clock = FixedClock::on_date(date);
/// assert_eq!(clock.today(), date);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// A clock that always reports `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// A clock fixed at midnight UTC on `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_never_moves() {
        let clock = FixedClock::on_date(NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
    }

    #[test]
    fn test_system_clock_today_matches_now() {
        let clock = SystemClock;
        let now = clock.now();
        assert!(clock.today() >= now.date_naive());
    }
}
