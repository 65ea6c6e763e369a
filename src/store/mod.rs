//! Storage and clock seams for the payroll engine.
//!
//! The engine never talks to a database directly. It reads and writes through
//! the traits in this module, which the surrounding application implements on
//! top of its persistence layer. [`InMemoryStore`] implements all of them and
//! is what the tests and benchmarks run against.
//!
//! Methods documented as atomic must apply all of their writes or none.

mod clock;
mod memory;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    DateRange, Employee, LeaveRequest, LeaveStatus, PayrollItem, PayrollRun, SalaryStructure,
};

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::InMemoryStore;

/// Access to the employee roster owned by the HR system.
pub trait EmployeeRoster: Send + Sync {
    /// All employees on the roster.
    fn employees(&self) -> EngineResult<Vec<Employee>>;

    /// A single employee, if present.
    fn employee(&self, id: &str) -> EngineResult<Option<Employee>>;

    /// Overwrites an employee's leave balance.
    fn set_leave_balance(&self, id: &str, balance: Decimal) -> EngineResult<()>;
}

/// Persistence for salary structures.
pub trait SalaryStructureStore: Send + Sync {
    /// A structure by id.
    fn structure(&self, id: Uuid) -> EngineResult<Option<SalaryStructure>>;

    /// All structures of an employee, in no particular order.
    fn structures_for(&self, employee_id: &str) -> EngineResult<Vec<SalaryStructure>>;

    /// The structure whose interval contains `on`, if any.
    fn active_structure(
        &self,
        employee_id: &str,
        on: NaiveDate,
    ) -> EngineResult<Option<SalaryStructure>>;

    /// Atomically sets `effective_to = closed_to` on every structure in
    /// `close`, then inserts `structure`.
    fn assign_structure(
        &self,
        close: &[Uuid],
        closed_to: NaiveDate,
        structure: SalaryStructure,
    ) -> EngineResult<()>;

    /// Replaces an existing structure.
    fn update_structure(&self, structure: SalaryStructure) -> EngineResult<()>;

    /// Deletes a structure, returning false if it did not exist.
    fn remove_structure(&self, id: Uuid) -> EngineResult<bool>;
}

/// A leave balance write that accompanies a leave decision.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceUpdate {
    /// The employee whose balance changes.
    pub employee_id: String,
    /// The balance after the change.
    pub new_balance: Decimal,
}

/// Persistence for leave requests.
pub trait LeaveStore: Send + Sync {
    /// Stores a new request.
    fn insert_leave(&self, leave: LeaveRequest) -> EngineResult<()>;

    /// A request by id.
    fn leave(&self, id: Uuid) -> EngineResult<Option<LeaveRequest>>;

    /// Deletes a request, returning false if it did not exist.
    fn remove_leave(&self, id: Uuid) -> EngineResult<bool>;

    /// All requests, oldest first.
    fn all_leaves(&self) -> EngineResult<Vec<LeaveRequest>>;

    /// All requests of one employee, oldest first.
    fn leaves_for(&self, employee_id: &str) -> EngineResult<Vec<LeaveRequest>>;

    /// Pending or approved requests of `employee_id` sharing a day with `range`.
    fn overlapping_leaves(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> EngineResult<Vec<LeaveRequest>>;

    /// Approved sick or casual requests of `employee_id` sharing a day with `range`.
    fn approved_unpaid_leaves(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> EngineResult<Vec<LeaveRequest>>;

    /// Atomically sets a request's status and, when given, the owner's
    /// leave balance.
    fn record_decision(
        &self,
        leave_id: Uuid,
        status: LeaveStatus,
        balance: Option<BalanceUpdate>,
    ) -> EngineResult<()>;
}

/// Persistence for payroll runs and their items.
pub trait PayrollStore: Send + Sync {
    /// Stores a new run; fails with `Conflict` if one exists for the same
    /// year and month.
    fn insert_run(&self, run: PayrollRun) -> EngineResult<()>;

    /// A run by id.
    fn run(&self, id: Uuid) -> EngineResult<Option<PayrollRun>>;

    /// The run for a period, if any.
    fn run_for_period(&self, year: i32, month: u32) -> EngineResult<Option<PayrollRun>>;

    /// All runs, in no particular order.
    fn runs(&self) -> EngineResult<Vec<PayrollRun>>;

    /// Replaces an existing run.
    fn update_run(&self, run: PayrollRun) -> EngineResult<()>;

    /// Deletes every item of a run, returning how many were removed.
    fn delete_items_for_run(&self, run_id: Uuid) -> EngineResult<usize>;

    /// Stores a new item; fails with `Conflict` if the run already has an
    /// item for the same employee.
    fn insert_item(&self, item: PayrollItem) -> EngineResult<()>;

    /// All items of a run, ordered by employee id.
    fn items_for_run(&self, run_id: Uuid) -> EngineResult<Vec<PayrollItem>>;

    /// The item of one employee in one run, if any.
    fn item_for(&self, run_id: Uuid, employee_id: &str) -> EngineResult<Option<PayrollItem>>;

    /// All items of one employee across runs.
    fn items_for_employee(&self, employee_id: &str) -> EngineResult<Vec<PayrollItem>>;

    /// Atomically marks a run locked at `locked_at` and stamps `pay_date` on
    /// all of its items, returning how many items were stamped.
    fn lock_run(
        &self,
        run_id: Uuid,
        locked_at: DateTime<Utc>,
        pay_date: NaiveDate,
    ) -> EngineResult<usize>;
}

/// Everything the payroll run engine needs from storage.
pub trait PayrollRepository:
    EmployeeRoster + SalaryStructureStore + LeaveStore + PayrollStore
{
}

impl<T> PayrollRepository for T where
    T: EmployeeRoster + SalaryStructureStore + LeaveStore + PayrollStore
{
}
