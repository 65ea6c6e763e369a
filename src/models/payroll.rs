//! Payroll run and payroll item models.
//!
//! This module contains the [`PayrollRun`] lifecycle record, the per-employee
//! [`PayrollItem`] it produces, the [`AuditStep`] trail recorded on each
//! item, and the [`ProcessSummary`] returned from processing a run.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayPeriod;
use crate::error::EngineResult;

/// Lifecycle state of a payroll run.
///
/// ```text
/// Draft --process--> Processed --lock--> Locked
///                     |    ^
///                     +----+ process (re-process)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, no items computed yet.
    Draft,
    /// Items computed; may be re-processed or locked.
    Processed,
    /// Frozen; pay dates stamped and payslips visible to employees.
    Locked,
}

/// A payroll run for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// Calendar year of the run's period.
    pub year: i32,
    /// Calendar month of the run's period (1-12).
    pub month: u32,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the run was last processed.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the run was locked.
    pub locked_at: Option<DateTime<Utc>>,
}

impl PayrollRun {
    /// The pay period this run covers.
    pub fn period(&self) -> EngineResult<PayPeriod> {
        PayPeriod::for_month(self.year, self.month)
    }

    /// Returns true if the run has been locked.
    pub fn is_locked(&self) -> bool {
        self.status == RunStatus::Locked
    }

    /// Returns true if items exist for admin review (Processed or Locked).
    pub fn is_at_least_processed(&self) -> bool {
        matches!(self.status, RunStatus::Processed | RunStatus::Locked)
    }
}

/// A single step in the audit trail recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// One employee's pay for one run.
///
/// All monetary figures are monthly and carry two fraction digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollItem {
    /// Unique identifier for the item.
    pub id: Uuid,
    /// The run this item belongs to.
    pub run_id: Uuid,
    /// The employee this item pays.
    pub employee_id: String,
    /// Monthly base salary (annual base / 12).
    pub base_salary: Decimal,
    /// Monthly bonus.
    pub bonus: Decimal,
    /// Loss-of-pay deduction for unpaid leave in the period.
    pub deductions: Decimal,
    /// `base_salary + bonus - deductions`.
    pub net_salary: Decimal,
    /// Set when the run is locked.
    pub pay_date: Option<NaiveDate>,
    /// How the figures were derived.
    #[serde(default)]
    pub audit_trail: Vec<AuditStep>,
}

/// Why an employee was left out of a processed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    /// No salary structure covers the first day of the period.
    NoActiveStructure,
    /// The pay figures could not be computed.
    CalculationFailed(String),
    /// Reading inputs or writing the item failed.
    StorageFailed(String),
}

/// An employee skipped while processing a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEmployee {
    /// The employee that was skipped.
    pub employee_id: String,
    /// Why the employee was skipped.
    pub reason: SkipReason,
}

/// Outcome of processing a run.
///
/// Skipped employees are an expected, non-fatal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// The run that was processed.
    pub run_id: Uuid,
    /// Number of items written.
    pub processed_count: usize,
    /// Number of employees without an item.
    pub skipped_count: usize,
    /// Details for each skipped employee.
    pub skipped: Vec<SkippedEmployee>,
}
