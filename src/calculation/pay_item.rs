//! Per-employee pay item calculation.
//!
//! Composes the monthly base, bonus, and loss-of-pay calculations into the
//! figures stored on one payroll item.

use rust_decimal::Decimal;

use super::bonus::calculate_bonus;
use super::loss_of_pay::calculate_loss_of_pay;
use super::rounding::monthly_base;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, LeaveRequest, PayPeriod, SalaryStructure};

/// The computed figures for one employee in one pay period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayItemCalculation {
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// Monthly bonus.
    pub bonus: Decimal,
    /// Loss-of-pay deduction.
    pub deductions: Decimal,
    /// `base_salary + bonus - deductions`.
    pub net_salary: Decimal,
    /// Audit steps in calculation order.
    pub audit_trail: Vec<AuditStep>,
}

/// Calculates one employee's pay for a period from the structure effective
/// at the start of the period and the employee's leave.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_pay_item;
/// use payroll_engine::models::{BonusPolicy, PayPeriod, SalaryStructure};
/// use chrono::{NaiveDate, Utc};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use uuid::Uuid;
///
/// let structure = SalaryStructure {
///     id: Uuid::new_v4(),
///     employee_id: "emp_001".to_string(),
///     base_salary: Decimal::from(120_000),
///     bonus_policy: BonusPolicy::Percentage(Decimal::from(10)),
///     effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     effective_to: None,
///     created_at: Utc::now(),
/// };
/// let august = PayPeriod::for_month(2025, 8).unwrap();
///
/// let item = calculate_pay_item(&structure, &[], &august).unwrap();
/// assert_eq!(item.net_salary, Decimal::from_str("11000.00").unwrap());
/// assert_eq!(item.audit_trail.len(), 4);
/// ```
pub fn calculate_pay_item(
    structure: &SalaryStructure,
    leaves: &[LeaveRequest],
    period: &PayPeriod,
) -> EngineResult<PayItemCalculation> {
    let mut step_number: u32 = 1;

    let base_salary = monthly_base(structure.base_salary)?;

    let base_step = AuditStep {
        step_number,
        rule_id: "monthly_base".to_string(),
        rule_name: "Monthly Base Salary".to_string(),
        input: serde_json::json!({
            "structure_id": structure.id.to_string(),
            "annual_base": structure.base_salary.to_string()
        }),
        output: serde_json::json!({
            "monthly_base": base_salary.to_string()
        }),
        reasoning: format!("${} / 12 = ${}", structure.base_salary, base_salary),
    };
    step_number += 1;

    let bonus_result =
        calculate_bonus(&structure.bonus_policy, structure.base_salary, step_number)?;
    step_number += 1;

    let lop_result = calculate_loss_of_pay(
        &structure.employee_id,
        leaves,
        period,
        structure.base_salary,
        step_number,
    )?;
    step_number += 1;

    let bonus = bonus_result.bonus;
    let deductions = lop_result.deduction;
    let net_salary = base_salary
        .checked_add(bonus)
        .and_then(|gross| gross.checked_sub(deductions))
        .ok_or_else(|| EngineError::Calculation {
            message: format!(
                "net salary overflows for {} + {} - {}",
                base_salary, bonus, deductions
            ),
        })?;

    let net_step = AuditStep {
        step_number,
        rule_id: "net_salary".to_string(),
        rule_name: "Net Salary".to_string(),
        input: serde_json::json!({
            "base_salary": base_salary.to_string(),
            "bonus": bonus.to_string(),
            "deductions": deductions.to_string()
        }),
        output: serde_json::json!({
            "net_salary": net_salary.to_string()
        }),
        reasoning: format!(
            "${} + ${} - ${} = ${}",
            base_salary, bonus, deductions, net_salary
        ),
    };

    Ok(PayItemCalculation {
        base_salary,
        bonus,
        deductions,
        net_salary,
        audit_trail: vec![
            base_step,
            bonus_result.audit_step,
            lop_result.audit_step,
            net_step,
        ],
    })
}
