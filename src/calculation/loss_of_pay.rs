//! Loss-of-pay calculation functionality.
//!
//! Approved sick and casual leave is unpaid. This module converts the days of
//! such leave that fall inside a pay period into a salary deduction.

use rust_decimal::Decimal;
use tracing::debug;

use super::rounding::{divide_money, monthly_base, multiply_money};
use crate::error::EngineResult;
use crate::models::{AuditStep, LeaveRequest, PayPeriod};

/// The result of a loss-of-pay calculation, including the deduction and audit step.
#[derive(Debug, Clone)]
pub struct LossOfPayResult {
    /// The total deduction for the period.
    pub deduction: Decimal,
    /// Unpaid leave days that fall inside the period.
    pub unpaid_days: i64,
    /// Salary per calendar day of the period's month.
    pub per_day_rate: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the loss-of-pay deduction for one employee and pay period.
///
/// Only requests belonging to `employee_id` that are approved and of an
/// unpaid kind (sick or casual) count. Each such request is clipped to the
/// period, so leave spanning a month boundary is only charged for the days
/// inside this period. The per-day rate is the monthly base divided by the
/// number of days in the month; both it and the final deduction are rounded
/// to two fraction digits, half away from zero.
///
/// # Arguments
///
/// * `employee_id` - The employee being paid
/// * `leaves` - Candidate leave requests; anything not matching is ignored
/// * `period` - The pay period
/// * `annual_base` - The annual base salary of the effective structure
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_loss_of_pay;
/// use payroll_engine::models::PayPeriod;
/// use rust_decimal::Decimal;
///
/// let august = PayPeriod::for_month(2025, 8).unwrap();
/// let result = calculate_loss_of_pay("emp_001", &[], &august, Decimal::from(120_000), 3).unwrap();
/// assert_eq!(result.deduction, Decimal::ZERO);
/// assert_eq!(result.unpaid_days, 0);
/// ```
pub fn calculate_loss_of_pay(
    employee_id: &str,
    leaves: &[LeaveRequest],
    period: &PayPeriod,
    annual_base: Decimal,
    step_number: u32,
) -> EngineResult<LossOfPayResult> {
    let monthly = monthly_base(annual_base)?;
    let period_range = period.range();
    let days_in_month = period.days_in_month();

    let mut unpaid_days: i64 = 0;
    let mut counted = Vec::new();
    for leave in leaves
        .iter()
        .filter(|l| l.employee_id == employee_id && l.is_approved_unpaid())
    {
        if let Some(clipped) = leave.range().clip_to(&period_range) {
            let days = clipped.days();
            debug!(
                employee_id = %employee_id,
                leave_id = %leave.id,
                start = %leave.start_date,
                end = %leave.end_date,
                days_in_period = days,
                "Unpaid leave in payroll period"
            );
            unpaid_days += days;
            counted.push(serde_json::json!({
                "leave_id": leave.id.to_string(),
                "kind": leave.kind,
                "start": clipped.start.to_string(),
                "end": clipped.end.to_string(),
                "days": days
            }));
        }
    }

    let (per_day_rate, deduction) = if unpaid_days == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let per_day = divide_money(monthly, Decimal::from(days_in_month))?;
        (per_day, multiply_money(per_day, Decimal::from(unpaid_days))?)
    };

    let reasoning = if unpaid_days == 0 {
        "No approved unpaid leave in period".to_string()
    } else {
        format!(
            "${} / {} days = ${} per day x {} unpaid days = ${}",
            monthly, days_in_month, per_day_rate, unpaid_days, deduction
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "loss_of_pay".to_string(),
        rule_name: "Loss of Pay".to_string(),
        input: serde_json::json!({
            "monthly_base": monthly.to_string(),
            "period_start": period.start_date.to_string(),
            "period_end": period.end_date.to_string(),
            "days_in_month": days_in_month,
            "leaves": counted
        }),
        output: serde_json::json!({
            "unpaid_days": unpaid_days,
            "per_day_rate": per_day_rate.to_string(),
            "deduction": deduction.to_string()
        }),
        reasoning,
    };

    Ok(LossOfPayResult {
        deduction,
        unpaid_days,
        per_day_rate,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveKind, LeaveStatus};
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn leave(
        kind: LeaveKind,
        status: LeaveStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            kind,
            start_date: start,
            end_date: end,
            status,
            reason: String::new(),
            created_at: Utc::now(),
        }
    }

    fn august() -> PayPeriod {
        PayPeriod::for_month(2025, 8).unwrap()
    }

    fn deduct(leaves: &[LeaveRequest], period: &PayPeriod) -> LossOfPayResult {
        calculate_loss_of_pay("emp_001", leaves, period, dec("120000"), 3).unwrap()
    }

    #[test]
    fn test_two_sick_days_in_august() {
        let leaves = vec![leave(LeaveKind::Sick, LeaveStatus::Approved, date(8, 1), date(8, 2))];
        let result = deduct(&leaves, &august());

        assert_eq!(result.unpaid_days, 2);
        assert_eq!(result.per_day_rate, dec("322.58"));
        assert_eq!(result.deduction, dec("645.16"));
        assert_eq!(result.audit_step.output["deduction"], "645.16");
    }

    #[test]
    fn test_paid_leave_never_deducts() {
        let leaves = vec![leave(LeaveKind::Paid, LeaveStatus::Approved, date(8, 4), date(8, 8))];
        let result = deduct(&leaves, &august());
        assert_eq!(result.deduction, Decimal::ZERO);
        assert_eq!(result.unpaid_days, 0);
    }

    #[test]
    fn test_pending_and_rejected_leave_never_deduct() {
        let leaves = vec![
            leave(LeaveKind::Sick, LeaveStatus::Pending, date(8, 4), date(8, 5)),
            leave(LeaveKind::Casual, LeaveStatus::Rejected, date(8, 11), date(8, 12)),
        ];
        let result = deduct(&leaves, &august());
        assert_eq!(result.deduction, Decimal::ZERO);
    }

    #[test]
    fn test_leave_spanning_month_start_is_clipped() {
        // July 30 - August 2: only August 1-2 count
        let leaves = vec![leave(LeaveKind::Casual, LeaveStatus::Approved, date(7, 30), date(8, 2))];
        let result = deduct(&leaves, &august());
        assert_eq!(result.unpaid_days, 2);
        assert_eq!(result.deduction, dec("645.16"));
    }

    #[test]
    fn test_leave_spanning_month_end_is_clipped() {
        let leaves = vec![leave(LeaveKind::Sick, LeaveStatus::Approved, date(8, 29), date(9, 4))];
        let result = deduct(&leaves, &august());
        assert_eq!(result.unpaid_days, 3);
        assert_eq!(result.deduction, dec("967.74"));
    }

    #[test]
    fn test_leave_outside_period_is_ignored() {
        let leaves = vec![leave(LeaveKind::Sick, LeaveStatus::Approved, date(9, 1), date(9, 3))];
        let result = deduct(&leaves, &august());
        assert_eq!(result.unpaid_days, 0);
    }

    #[test]
    fn test_multiple_requests_are_summed() {
        let leaves = vec![
            leave(LeaveKind::Sick, LeaveStatus::Approved, date(8, 1), date(8, 2)),
            leave(LeaveKind::Casual, LeaveStatus::Approved, date(8, 20), date(8, 22)),
        ];
        let result = deduct(&leaves, &august());
        assert_eq!(result.unpaid_days, 5);
        assert_eq!(result.deduction, dec("1612.90"));
        assert_eq!(result.audit_step.input["leaves"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_other_employees_leave_is_ignored() {
        let mut other = leave(LeaveKind::Sick, LeaveStatus::Approved, date(8, 1), date(8, 2));
        other.employee_id = "emp_999".to_string();
        let result = deduct(&[other], &august());
        assert_eq!(result.deduction, Decimal::ZERO);
    }

    #[test]
    fn test_february_uses_28_day_rate() {
        let february = PayPeriod::for_month(2025, 2).unwrap();
        let leaves = vec![leave(LeaveKind::Sick, LeaveStatus::Approved, date(2, 3), date(2, 3))];
        let result = deduct(&leaves, &february);
        // 10000.00 / 28 = 357.142857 -> 357.14
        assert_eq!(result.per_day_rate, dec("357.14"));
        assert_eq!(result.deduction, dec("357.14"));
    }
}
