//! Payroll run engine.
//!
//! A run covers one calendar month and moves through
//! `Draft -> Processed -> Locked`. Processing computes one
//! [`PayrollItem`] per employee with a salary structure in effect on the
//! first day of the month; employees without one are skipped and reported in
//! the [`ProcessSummary`]. Locking freezes the run and stamps the pay date on
//! every item, which is what makes payslips visible to employees.
//!
//! `process` and `lock` for the same run are serialized. The roster itself is
//! processed in parallel with [`rayon`], one independent unit of work per
//! employee.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::calculate_pay_item;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, PayPeriod, PayrollItem, PayrollRun, ProcessSummary, RunStatus, SkipReason,
    SkippedEmployee,
};
use crate::store::{Clock, PayrollRepository};
use crate::sync::KeyedLocks;
use crate::timeline::SalaryTimeline;

/// Creates, processes and locks payroll runs.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use payroll_engine::config::EngineConfig;
/// use payroll_engine::models::{BonusPolicy, Employee, StructureTerms};
/// use payroll_engine::payroll::PayrollEngine;
/// use payroll_engine::store::{FixedClock, InMemoryStore};
///
/// let store = Arc::new(InMemoryStore::with_employees(vec![
///     Employee::new("emp_001", "Ada", Decimal::from(12)),
/// ]));
/// let clock = Arc::new(FixedClock::on_date(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()));
/// let engine = PayrollEngine::new(store, clock, EngineConfig::default()).unwrap();
///
/// engine.timeline().assign("emp_001", StructureTerms {
///     base_salary: Decimal::from(120_000),
///     bonus_policy: BonusPolicy::None,
///     effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     effective_to: None,
/// }).unwrap();
///
/// let run = engine.create(2025, 8).unwrap();
/// let summary = engine.process(run.id).unwrap();
/// assert_eq!(summary.processed_count, 1);
/// ```
pub struct PayrollEngine<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    timeline: SalaryTimeline<S>,
    run_locks: KeyedLocks<Uuid>,
    pool: Option<ThreadPool>,
}

impl<S> PayrollEngine<S>
where
    S: PayrollRepository + ?Sized,
{
    /// Creates an engine over `store`.
    ///
    /// When `config.worker_threads` is set a dedicated rayon pool of that
    /// size is built for roster processing.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let pool = match config.worker_threads {
            Some(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("payroll-worker-{}", i))
                    .build()
                    .map_err(|e| EngineError::Validation {
                        field: "worker_threads".to_string(),
                        message: e.to_string(),
                    })?,
            ),
            None => None,
        };
        let timeline = SalaryTimeline::new(Arc::clone(&store), Arc::clone(&clock), config.clone());

        Ok(Self {
            store,
            clock,
            config,
            timeline,
            run_locks: KeyedLocks::new(),
            pool,
        })
    }

    /// The salary timeline the engine resolves structures from.
    pub fn timeline(&self) -> &SalaryTimeline<S> {
        &self.timeline
    }

    /// Creates a `Draft` run for a calendar month.
    ///
    /// # Errors
    ///
    /// - `Validation` if `month` is not 1-12 or `year` is not four digits
    /// - `Conflict` if a run already exists for the period
    pub fn create(&self, year: i32, month: u32) -> EngineResult<PayrollRun> {
        if !(1000..=9999).contains(&year) {
            return Err(EngineError::Validation {
                field: "year".to_string(),
                message: format!("expected a four-digit year, got {}", year),
            });
        }
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation {
                field: "month".to_string(),
                message: format!("expected 1-12, got {}", month),
            });
        }
        if self.store.run_for_period(year, month)?.is_some() {
            return Err(EngineError::Conflict {
                message: format!("a payroll run for {}-{:02} already exists", year, month),
            });
        }

        let run = PayrollRun {
            id: Uuid::new_v4(),
            year,
            month,
            status: RunStatus::Draft,
            created_at: self.clock.now(),
            processed_at: None,
            locked_at: None,
        };
        self.store.insert_run(run.clone())?;

        info!(run_id = %run.id, year, month, "Payroll run created");
        Ok(run)
    }

    /// Computes an item for every employee with a structure in effect on the
    /// first day of the run's month.
    ///
    /// Any items from an earlier processing are deleted before new ones are
    /// written, so the run always reflects the current roster. Employees
    /// that cannot be computed are skipped and listed in the summary; the run
    /// still moves to `Processed`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the run does not exist
    /// - `InvalidState` if the run is locked
    pub fn process(&self, run_id: Uuid) -> EngineResult<ProcessSummary> {
        self.run_locks.with_lock(run_id, || {
            let mut run = self.run(run_id)?;
            if run.is_locked() {
                return Err(EngineError::invalid_state(
                    "locked payrolls cannot be processed",
                ));
            }

            let removed = self.store.delete_items_for_run(run_id)?;
            if removed > 0 {
                info!(run_id = %run_id, removed, "Re-processing run, previous items deleted");
            }

            let period = run.period()?;
            let mut employees = self.store.employees()?;
            employees.sort_by(|a, b| a.id.cmp(&b.id));

            let outcomes = self.compute_roster(run_id, &period, &employees);

            let mut skipped = Vec::new();
            let mut processed_count = 0;
            for (employee_id, outcome) in outcomes {
                match outcome {
                    Ok(()) => processed_count += 1,
                    Err(reason) => {
                        warn!(
                            run_id = %run_id,
                            employee_id = %employee_id,
                            reason = ?reason,
                            "Employee skipped"
                        );
                        skipped.push(SkippedEmployee {
                            employee_id,
                            reason,
                        });
                    }
                }
            }

            run.status = RunStatus::Processed;
            run.processed_at = Some(self.clock.now());
            self.store.update_run(run)?;

            info!(
                run_id = %run_id,
                processed = processed_count,
                skipped = skipped.len(),
                "Payroll run processed"
            );
            Ok(ProcessSummary {
                run_id,
                processed_count,
                skipped_count: skipped.len(),
                skipped,
            })
        })
    }

    /// Locks a processed run and stamps today's date as the pay date on all
    /// of its items.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the run does not exist
    /// - `InvalidState` unless the run is `Processed`
    pub fn lock(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.run_locks.with_lock(run_id, || {
            let run = self.run(run_id)?;
            if run.status != RunStatus::Processed {
                return Err(EngineError::invalid_state(format!(
                    "only processed payrolls can be locked, run {} is {:?}",
                    run_id, run.status
                )));
            }

            let pay_date = self.clock.today();
            let stamped = self.store.lock_run(run_id, self.clock.now(), pay_date)?;
            info!(run_id = %run_id, items = stamped, pay_date = %pay_date, "Payroll run locked");
            self.run(run_id)
        })
    }

    /// All runs, newest period first.
    pub fn runs(&self) -> EngineResult<Vec<PayrollRun>> {
        let mut runs = self.store.runs()?;
        runs.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(runs)
    }

    /// A run by id.
    pub fn run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.store
            .run(run_id)?
            .ok_or_else(|| EngineError::not_found("payroll run", run_id))
    }

    /// Returns true if a run exists for the period.
    pub fn run_exists(&self, year: i32, month: u32) -> EngineResult<bool> {
        Ok(self.store.run_for_period(year, month)?.is_some())
    }

    /// All items of a run, ordered by employee id.
    pub fn items_for_run(&self, run_id: Uuid) -> EngineResult<Vec<PayrollItem>> {
        self.run(run_id)?;
        self.store.items_for_run(run_id)
    }

    /// One employee's item for review before locking.
    ///
    /// Fails with `NotAvailable` while the run is still a draft.
    pub fn item_for_admin(&self, run_id: Uuid, employee_id: &str) -> EngineResult<PayrollItem> {
        let run = self.run(run_id)?;
        if !run.is_at_least_processed() {
            return Err(EngineError::NotAvailable {
                message: format!("payroll run {} has not been processed", run_id),
            });
        }
        self.item(run_id, employee_id)
    }

    /// One employee's payslip.
    ///
    /// Fails with `NotAvailable` unless the run is locked.
    pub fn payslip_for(&self, run_id: Uuid, employee_id: &str) -> EngineResult<PayrollItem> {
        let run = self.run(run_id)?;
        if !run.is_locked() {
            return Err(EngineError::NotAvailable {
                message: format!("payroll run {} is not locked yet", run_id),
            });
        }
        self.item(run_id, employee_id)
    }

    /// Every payslip of an employee from locked runs, newest pay date first.
    pub fn employee_payslips(&self, employee_id: &str) -> EngineResult<Vec<PayrollItem>> {
        if self.store.employee(employee_id)?.is_none() {
            return Err(EngineError::not_found("employee", employee_id));
        }

        let mut payslips = Vec::new();
        for item in self.store.items_for_employee(employee_id)? {
            if let Some(run) = self.store.run(item.run_id)? {
                if run.is_locked() {
                    payslips.push((run.year, run.month, item));
                }
            }
        }
        payslips.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        Ok(payslips.into_iter().map(|(_, _, item)| item).collect())
    }

    fn item(&self, run_id: Uuid, employee_id: &str) -> EngineResult<PayrollItem> {
        self.store.item_for(run_id, employee_id)?.ok_or_else(|| {
            EngineError::not_found("payroll item", format!("{}/{}", run_id, employee_id))
        })
    }

    fn compute_roster(
        &self,
        run_id: Uuid,
        period: &PayPeriod,
        employees: &[Employee],
    ) -> Vec<(String, Result<(), SkipReason>)> {
        let compute = |employee: &Employee| {
            (
                employee.id.clone(),
                self.compute_employee(run_id, period, employee),
            )
        };

        if !self.config.parallel_processing {
            return employees.iter().map(compute).collect();
        }
        match &self.pool {
            Some(pool) => pool.install(|| employees.par_iter().map(compute).collect()),
            None => employees.par_iter().map(compute).collect(),
        }
    }

    /// Resolves, computes and stores one employee's item.
    fn compute_employee(
        &self,
        run_id: Uuid,
        period: &PayPeriod,
        employee: &Employee,
    ) -> Result<(), SkipReason> {
        let structure = match self
            .timeline
            .active_structure_for(&employee.id, period.start_date)
        {
            Ok(structure) => structure,
            Err(EngineError::NotFound { .. }) => return Err(SkipReason::NoActiveStructure),
            Err(e) => return Err(SkipReason::StorageFailed(e.to_string())),
        };

        let leaves = self
            .store
            .approved_unpaid_leaves(&employee.id, period.range())
            .map_err(|e| SkipReason::StorageFailed(e.to_string()))?;

        let pay = calculate_pay_item(&structure, &leaves, period)
            .map_err(|e| SkipReason::CalculationFailed(e.to_string()))?;

        self.store
            .insert_item(PayrollItem {
                id: Uuid::new_v4(),
                run_id,
                employee_id: employee.id.clone(),
                base_salary: pay.base_salary,
                bonus: pay.bonus,
                deductions: pay.deductions,
                net_salary: pay.net_salary,
                pay_date: None,
                audit_trail: pay.audit_trail,
            })
            .map_err(|e| SkipReason::StorageFailed(e.to_string()))
    }
}
