//! Core data models for the payroll engine.
//!
//! Records reference each other by identifier only; related records are
//! looked up through the store traits in [`crate::store`].

mod employee;
mod leave;
mod pay_period;
mod payroll;
mod salary;

pub use employee::Employee;
pub use leave::{LeaveKind, LeaveRequest, LeaveStatus};
pub use pay_period::{DateRange, PayPeriod};
pub use payroll::{
    AuditStep, PayrollItem, PayrollRun, ProcessSummary, RunStatus, SkipReason, SkippedEmployee,
};
pub use salary::{BonusPolicy, SalaryStructure, StructureTerms};
