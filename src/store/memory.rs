//! In-memory implementation of every store trait.
//!
//! All state lives behind one [`RwLock`], so each trait method, including the
//! atomic multi-record ones, observes and applies a consistent snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{BalanceUpdate, EmployeeRoster, LeaveStore, PayrollStore, SalaryStructureStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DateRange, Employee, LeaveRequest, LeaveStatus, PayrollItem, PayrollRun, RunStatus,
    SalaryStructure,
};

#[derive(Debug, Default)]
struct State {
    employees: BTreeMap<String, Employee>,
    structures: HashMap<Uuid, SalaryStructure>,
    leaves: HashMap<Uuid, LeaveRequest>,
    runs: HashMap<Uuid, PayrollRun>,
    items: HashMap<Uuid, PayrollItem>,
}

/// A thread-safe store holding everything in process memory.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Employee;
/// use payroll_engine::store::{EmployeeRoster, InMemoryStore};
/// use rust_decimal::Decimal;
///
/// let store = InMemoryStore::with_employees(vec![
///     Employee::new("emp_001", "Ada", Decimal::from(12)),
/// ]);
/// assert_eq!(store.employees().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with a roster.
    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            for employee in employees {
                state.employees.insert(employee.id.clone(), employee);
            }
        }
        store
    }

    /// Adds or replaces an employee on the roster.
    pub fn upsert_employee(&self, employee: Employee) -> EngineResult<()> {
        self.write()?.employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    /// Removes an employee from the roster, keeping their historical records.
    pub fn remove_employee(&self, id: &str) -> EngineResult<bool> {
        Ok(self.write()?.employees.remove(id).is_some())
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| EngineError::Storage {
            message: "store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| EngineError::Storage {
            message: "store lock poisoned".to_string(),
        })
    }
}

fn sorted_by_creation(mut leaves: Vec<LeaveRequest>) -> Vec<LeaveRequest> {
    leaves.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.start_date.cmp(&b.start_date))
    });
    leaves
}

impl EmployeeRoster for InMemoryStore {
    fn employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.read()?.employees.values().cloned().collect())
    }

    fn employee(&self, id: &str) -> EngineResult<Option<Employee>> {
        Ok(self.read()?.employees.get(id).cloned())
    }

    fn set_leave_balance(&self, id: &str, balance: Decimal) -> EngineResult<()> {
        let mut state = self.write()?;
        let employee = state
            .employees
            .get_mut(id)
            .ok_or_else(|| EngineError::not_found("employee", id))?;
        employee.leave_balance = balance;
        Ok(())
    }
}

impl SalaryStructureStore for InMemoryStore {
    fn structure(&self, id: Uuid) -> EngineResult<Option<SalaryStructure>> {
        Ok(self.read()?.structures.get(&id).cloned())
    }

    fn structures_for(&self, employee_id: &str) -> EngineResult<Vec<SalaryStructure>> {
        Ok(self
            .read()?
            .structures
            .values()
            .filter(|s| s.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn active_structure(
        &self,
        employee_id: &str,
        on: NaiveDate,
    ) -> EngineResult<Option<SalaryStructure>> {
        Ok(self
            .read()?
            .structures
            .values()
            .filter(|s| s.employee_id == employee_id && s.is_effective_on(on))
            .max_by_key(|s| s.effective_from)
            .cloned())
    }

    fn assign_structure(
        &self,
        close: &[Uuid],
        closed_to: NaiveDate,
        structure: SalaryStructure,
    ) -> EngineResult<()> {
        let mut state = self.write()?;
        if let Some(missing) = close.iter().find(|id| !state.structures.contains_key(*id)) {
            return Err(EngineError::not_found("salary structure", missing));
        }
        for id in close {
            if let Some(existing) = state.structures.get_mut(id) {
                existing.effective_to = Some(closed_to);
            }
        }
        state.structures.insert(structure.id, structure);
        Ok(())
    }

    fn update_structure(&self, structure: SalaryStructure) -> EngineResult<()> {
        let mut state = self.write()?;
        match state.structures.get_mut(&structure.id) {
            Some(existing) => {
                *existing = structure;
                Ok(())
            }
            None => Err(EngineError::not_found("salary structure", structure.id)),
        }
    }

    fn remove_structure(&self, id: Uuid) -> EngineResult<bool> {
        Ok(self.write()?.structures.remove(&id).is_some())
    }
}

impl LeaveStore for InMemoryStore {
    fn insert_leave(&self, leave: LeaveRequest) -> EngineResult<()> {
        let mut state = self.write()?;
        if state.leaves.contains_key(&leave.id) {
            return Err(EngineError::Conflict {
                message: format!("leave request {} already exists", leave.id),
            });
        }
        state.leaves.insert(leave.id, leave);
        Ok(())
    }

    fn leave(&self, id: Uuid) -> EngineResult<Option<LeaveRequest>> {
        Ok(self.read()?.leaves.get(&id).cloned())
    }

    fn remove_leave(&self, id: Uuid) -> EngineResult<bool> {
        Ok(self.write()?.leaves.remove(&id).is_some())
    }

    fn all_leaves(&self) -> EngineResult<Vec<LeaveRequest>> {
        Ok(sorted_by_creation(
            self.read()?.leaves.values().cloned().collect(),
        ))
    }

    fn leaves_for(&self, employee_id: &str) -> EngineResult<Vec<LeaveRequest>> {
        Ok(sorted_by_creation(
            self.read()?
                .leaves
                .values()
                .filter(|l| l.employee_id == employee_id)
                .cloned()
                .collect(),
        ))
    }

    fn overlapping_leaves(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> EngineResult<Vec<LeaveRequest>> {
        Ok(self
            .read()?
            .leaves
            .values()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.status.blocks_overlap()
                    && l.range().intersects(&range)
            })
            .cloned()
            .collect())
    }

    fn approved_unpaid_leaves(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> EngineResult<Vec<LeaveRequest>> {
        Ok(self
            .read()?
            .leaves
            .values()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.is_approved_unpaid()
                    && l.range().intersects(&range)
            })
            .cloned()
            .collect())
    }

    fn record_decision(
        &self,
        leave_id: Uuid,
        status: LeaveStatus,
        balance: Option<BalanceUpdate>,
    ) -> EngineResult<()> {
        let mut state = self.write()?;
        if !state.leaves.contains_key(&leave_id) {
            return Err(EngineError::not_found("leave request", leave_id));
        }
        if let Some(update) = &balance {
            if !state.employees.contains_key(&update.employee_id) {
                return Err(EngineError::not_found("employee", &update.employee_id));
            }
        }

        if let Some(update) = balance {
            if let Some(employee) = state.employees.get_mut(&update.employee_id) {
                employee.leave_balance = update.new_balance;
            }
        }
        if let Some(leave) = state.leaves.get_mut(&leave_id) {
            leave.status = status;
        }
        Ok(())
    }
}

impl PayrollStore for InMemoryStore {
    fn insert_run(&self, run: PayrollRun) -> EngineResult<()> {
        let mut state = self.write()?;
        if state
            .runs
            .values()
            .any(|r| r.year == run.year && r.month == run.month)
        {
            return Err(EngineError::Conflict {
                message: format!(
                    "a payroll run for {}-{:02} already exists",
                    run.year, run.month
                ),
            });
        }
        state.runs.insert(run.id, run);
        Ok(())
    }

    fn run(&self, id: Uuid) -> EngineResult<Option<PayrollRun>> {
        Ok(self.read()?.runs.get(&id).cloned())
    }

    fn run_for_period(&self, year: i32, month: u32) -> EngineResult<Option<PayrollRun>> {
        Ok(self
            .read()?
            .runs
            .values()
            .find(|r| r.year == year && r.month == month)
            .cloned())
    }

    fn runs(&self) -> EngineResult<Vec<PayrollRun>> {
        Ok(self.read()?.runs.values().cloned().collect())
    }

    fn update_run(&self, run: PayrollRun) -> EngineResult<()> {
        let mut state = self.write()?;
        match state.runs.get_mut(&run.id) {
            Some(existing) => {
                *existing = run;
                Ok(())
            }
            None => Err(EngineError::not_found("payroll run", run.id)),
        }
    }

    fn delete_items_for_run(&self, run_id: Uuid) -> EngineResult<usize> {
        let mut state = self.write()?;
        let before = state.items.len();
        state.items.retain(|_, item| item.run_id != run_id);
        Ok(before - state.items.len())
    }

    fn insert_item(&self, item: PayrollItem) -> EngineResult<()> {
        let mut state = self.write()?;
        if state
            .items
            .values()
            .any(|i| i.run_id == item.run_id && i.employee_id == item.employee_id)
        {
            return Err(EngineError::Conflict {
                message: format!(
                    "run {} already has an item for employee '{}'",
                    item.run_id, item.employee_id
                ),
            });
        }
        state.items.insert(item.id, item);
        Ok(())
    }

    fn items_for_run(&self, run_id: Uuid) -> EngineResult<Vec<PayrollItem>> {
        let mut items: Vec<PayrollItem> = self
            .read()?
            .items
            .values()
            .filter(|i| i.run_id == run_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(items)
    }

    fn item_for(&self, run_id: Uuid, employee_id: &str) -> EngineResult<Option<PayrollItem>> {
        Ok(self
            .read()?
            .items
            .values()
            .find(|i| i.run_id == run_id && i.employee_id == employee_id)
            .cloned())
    }

    fn items_for_employee(&self, employee_id: &str) -> EngineResult<Vec<PayrollItem>> {
        Ok(self
            .read()?
            .items
            .values()
            .filter(|i| i.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn lock_run(
        &self,
        run_id: Uuid,
        locked_at: DateTime<Utc>,
        pay_date: NaiveDate,
    ) -> EngineResult<usize> {
        let mut state = self.write()?;
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| EngineError::not_found("payroll run", run_id))?;
        run.status = RunStatus::Locked;
        run.locked_at = Some(locked_at);

        let mut stamped = 0;
        for item in state.items.values_mut().filter(|i| i.run_id == run_id) {
            item.pay_date = Some(pay_date);
            stamped += 1;
        }
        Ok(stamped)
    }
}
