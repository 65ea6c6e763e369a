//! Shared money rounding policy.
//!
//! Every monetary division in the engine goes through [`divide_money`] so
//! that the same rounding (half away from zero, two fraction digits) applies
//! everywhere.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};

/// Number of fraction digits carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Number of pay months in a year.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Rounds an amount to two fraction digits, half away from zero.
///
/// The result always carries exactly two fraction digits so that amounts
/// render consistently (e.g. `10000.00`).
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("322.585").unwrap()).to_string(), "322.59");
/// assert_eq!(round_money(Decimal::from(10_000)).to_string(), "10000.00");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Divides two amounts and rounds the quotient with [`round_money`].
///
/// Fails with [`EngineError::Calculation`] on division by zero or overflow.
pub fn divide_money(numerator: Decimal, denominator: Decimal) -> EngineResult<Decimal> {
    numerator
        .checked_div(denominator)
        .map(round_money)
        .ok_or_else(|| EngineError::Calculation {
            message: format!("cannot divide {} by {}", numerator, denominator),
        })
}

/// Multiplies two amounts and rounds the product with [`round_money`].
pub fn multiply_money(left: Decimal, right: Decimal) -> EngineResult<Decimal> {
    left.checked_mul(right)
        .map(round_money)
        .ok_or_else(|| EngineError::Calculation {
            message: format!("{} x {} overflows", left, right),
        })
}

/// Derives the monthly base salary from an annual figure.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::monthly_base;
/// use rust_decimal::Decimal;
///
/// assert_eq!(monthly_base(Decimal::from(120_000)).unwrap().to_string(), "10000.00");
/// assert_eq!(monthly_base(Decimal::from(100_000)).unwrap().to_string(), "8333.33");
/// ```
pub fn monthly_base(annual_base: Decimal) -> EngineResult<Decimal> {
    divide_money(annual_base, MONTHS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_midpoint_rounds_up() {
        assert_eq!(round_money(dec("0.125")), dec("0.13"));
        assert_eq!(round_money(dec("2.675")), dec("2.68"));
    }

    #[test]
    fn test_below_midpoint_rounds_down() {
        assert_eq!(round_money(dec("0.1249")), dec("0.12"));
    }

    #[test]
    fn test_negative_midpoint_rounds_away_from_zero() {
        assert_eq!(round_money(dec("-0.125")), dec("-0.13"));
    }

    #[test]
    fn test_round_money_pads_to_two_digits() {
        assert_eq!(round_money(dec("5")).to_string(), "5.00");
        assert_eq!(round_money(dec("5.1")).to_string(), "5.10");
    }

    #[test]
    fn test_divide_money_per_day_rate() {
        assert_eq!(divide_money(dec("10000.00"), dec("31")).unwrap(), dec("322.58"));
        assert_eq!(divide_money(dec("10000.00"), dec("30")).unwrap(), dec("333.33"));
    }

    #[test]
    fn test_divide_by_zero_is_calculation_error() {
        let err = divide_money(dec("100"), Decimal::ZERO).unwrap_err();
        assert_eq!(err.code(), "CALCULATION_ERROR");
    }

    #[test]
    fn test_multiply_overflow_is_calculation_error() {
        assert!(multiply_money(Decimal::MAX, dec("2")).is_err());
    }

    #[test]
    fn test_monthly_base_rounds_half_up() {
        // 100000.06 / 12 = 8333.338333...
        assert_eq!(monthly_base(dec("100000.06")).unwrap(), dec("8333.34"));
        assert_eq!(monthly_base(dec("120000")).unwrap(), dec("10000.00"));
    }
}
