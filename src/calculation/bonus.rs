//! Bonus calculation functionality.
//!
//! This module turns a salary structure's [`BonusPolicy`] into the monthly
//! bonus paid on a payroll item.

use rust_decimal::Decimal;
use tracing::warn;

use super::rounding::{divide_money, monthly_base};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, BonusPolicy};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// The result of a bonus calculation, including the amount and audit step.
#[derive(Debug, Clone)]
pub struct BonusResult {
    /// The monthly bonus.
    pub bonus: Decimal,
    /// The monthly base the bonus was derived from.
    pub monthly_base: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the monthly bonus for a structure's bonus policy.
///
/// The monthly base is `annual_base / 12`. A percentage policy pays that
/// percentage of the monthly base; a fixed amount is paid as-is. Every
/// division is rounded to two fraction digits, half away from zero.
///
/// A negative percentage or amount cannot be a real bonus: it degrades to a
/// zero bonus with a warning rather than failing, so that one employee's bad
/// data never stops a run.
///
/// # Arguments
///
/// * `policy` - The structure's bonus policy
/// * `annual_base` - The structure's annual base salary
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns [`crate::error::EngineError::Calculation`] only if the arithmetic overflows.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_bonus;
/// use payroll_engine::models::BonusPolicy;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = calculate_bonus(
///     &BonusPolicy::Percentage(Decimal::from(10)),
///     Decimal::from(120_000),
///     2,
/// ).unwrap();
/// assert_eq!(result.bonus, Decimal::from_str("1000.00").unwrap());
/// ```
pub fn calculate_bonus(
    policy: &BonusPolicy,
    annual_base: Decimal,
    step_number: u32,
) -> EngineResult<BonusResult> {
    let monthly = monthly_base(annual_base)?;

    let (bonus, policy_name, reasoning) = match policy {
        BonusPolicy::None => (Decimal::ZERO, "none", "No bonus policy".to_string()),
        BonusPolicy::Percentage(percentage) if percentage.is_sign_negative() => {
            warn!(percentage = %percentage, "Negative bonus percentage, paying no bonus");
            (
                Decimal::ZERO,
                "percentage",
                format!("Negative percentage {}% ignored", percentage),
            )
        }
        BonusPolicy::Percentage(percentage) => {
            let scaled = monthly
                .checked_mul(*percentage)
                .ok_or_else(|| EngineError::Calculation {
                    message: format!("{} x {}% overflows", monthly, percentage),
                })?;
            let bonus = divide_money(scaled, HUNDRED)?;
            (
                bonus,
                "percentage",
                format!("${} x {}% = ${}", monthly, percentage.normalize(), bonus),
            )
        }
        BonusPolicy::FixedAmount(amount) if amount.is_sign_negative() => {
            warn!(amount = %amount, "Negative fixed bonus, paying no bonus");
            (
                Decimal::ZERO,
                "fixed_amount",
                format!("Negative fixed amount ${} ignored", amount),
            )
        }
        BonusPolicy::FixedAmount(amount) => (
            *amount,
            "fixed_amount",
            format!("Fixed monthly bonus ${}", amount),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "bonus".to_string(),
        rule_name: "Monthly Bonus".to_string(),
        input: serde_json::json!({
            "policy": policy_name,
            "annual_base": annual_base.to_string(),
            "monthly_base": monthly.to_string()
        }),
        output: serde_json::json!({
            "bonus": bonus.to_string()
        }),
        reasoning,
    };

    Ok(BonusResult {
        bonus,
        monthly_base: monthly,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_no_policy_pays_zero() {
        let result = calculate_bonus(&BonusPolicy::None, dec("120000"), 1).unwrap();
        assert_eq!(result.bonus, Decimal::ZERO);
        assert_eq!(result.monthly_base, dec("10000.00"));
        assert_eq!(result.audit_step.input["policy"], "none");
    }

    #[test]
    fn test_ten_percent_of_monthly_base() {
        let result =
            calculate_bonus(&BonusPolicy::Percentage(dec("10")), dec("120000"), 1).unwrap();
        assert_eq!(result.bonus, dec("1000.00"));
        assert_eq!(result.audit_step.output["bonus"], "1000.00");
        assert!(result.audit_step.reasoning.contains("10%"));
    }

    #[test]
    fn test_percentage_uses_rounded_monthly_base() {
        // 100000 / 12 = 8333.33; 8333.33 x 7.5% = 624.99975 -> 625.00
        let result =
            calculate_bonus(&BonusPolicy::Percentage(dec("7.5")), dec("100000"), 1).unwrap();
        assert_eq!(result.monthly_base, dec("8333.33"));
        assert_eq!(result.bonus, dec("625.00"));
    }

    #[test]
    fn test_fixed_amount_taken_verbatim() {
        let result =
            calculate_bonus(&BonusPolicy::FixedAmount(dec("750.5")), dec("120000"), 1).unwrap();
        assert_eq!(result.bonus, dec("750.5"));
        assert_eq!(result.audit_step.input["policy"], "fixed_amount");
    }

    #[test]
    fn test_negative_percentage_degrades_to_zero() {
        let result =
            calculate_bonus(&BonusPolicy::Percentage(dec("-5")), dec("120000"), 1).unwrap();
        assert_eq!(result.bonus, Decimal::ZERO);
        assert!(result.audit_step.reasoning.contains("ignored"));
    }

    #[test]
    fn test_negative_fixed_amount_degrades_to_zero() {
        let result =
            calculate_bonus(&BonusPolicy::FixedAmount(dec("-100")), dec("120000"), 1).unwrap();
        assert_eq!(result.bonus, Decimal::ZERO);
    }

    #[test]
    fn test_audit_step_has_correct_step_number() {
        let result = calculate_bonus(&BonusPolicy::None, dec("120000"), 7).unwrap();
        assert_eq!(result.audit_step.step_number, 7);
        assert_eq!(result.audit_step.rule_id, "bonus");
    }
}
