//! Leave request ledger.
//!
//! Validates new leave requests, moves them through their lifecycle and keeps
//! employee paid leave balances consistent with approved paid leave.
//!
//! All balance work for one employee (apply and approve) runs under that
//! employee's lock, so two concurrent approvals cannot both pass the balance
//! check against the same starting balance.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{DateRange, Employee, LeaveKind, LeaveRequest, LeaveStatus};
use crate::store::{BalanceUpdate, Clock, EmployeeRoster, LeaveStore};
use crate::sync::KeyedLocks;

/// Records leave requests and the decisions taken on them.
pub struct LeaveLedger<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: KeyedLocks<String>,
}

impl<S> LeaveLedger<S>
where
    S: EmployeeRoster + LeaveStore + ?Sized,
{
    /// Creates a ledger over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Files a new leave request in the `Pending` state.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the employee does not exist
    /// - `InvalidRange` if `start > end` or the request is longer than the
    ///   configured maximum
    /// - `Overlap` if a pending or approved request shares a day with it
    /// - `InsufficientBalance` if paid leave exceeds the current balance
    ///
    /// Nothing is stored when any check fails.
    pub fn apply(
        &self,
        employee_id: &str,
        kind: LeaveKind,
        start: NaiveDate,
        end: NaiveDate,
        reason: impl Into<String>,
    ) -> EngineResult<LeaveRequest> {
        let employee = self.employee(employee_id)?;

        if start > end {
            return Err(EngineError::InvalidRange {
                message: format!("start {} is after end {}", start, end),
            });
        }
        let range = DateRange::new(start, end);
        let duration = range.days();
        if duration > self.config.max_leave_days {
            return Err(EngineError::InvalidRange {
                message: format!(
                    "{} days requested, at most {} allowed",
                    duration, self.config.max_leave_days
                ),
            });
        }

        self.locks.with_lock(employee_id.to_string(), || {
            if !self.store.overlapping_leaves(employee_id, range)?.is_empty() {
                return Err(EngineError::Overlap {
                    employee_id: employee_id.to_string(),
                    start,
                    end,
                });
            }

            if kind == LeaveKind::Paid {
                // Re-read under the lock; the roster copy above may be stale.
                let current = self.employee(employee_id)?;
                if !current.can_take_paid_days(duration) {
                    return Err(EngineError::InsufficientBalance {
                        requested: duration,
                        available: current.leave_balance,
                    });
                }
            }

            let request = LeaveRequest {
                id: Uuid::new_v4(),
                employee_id: employee.id.clone(),
                kind,
                start_date: start,
                end_date: end,
                status: LeaveStatus::Pending,
                reason: reason.into().trim().to_string(),
                created_at: self.clock.now(),
            };
            self.store.insert_leave(request.clone())?;

            debug!(
                leave_id = %request.id,
                employee_id = %employee_id,
                kind = ?kind,
                days = duration,
                "Leave request filed"
            );
            Ok(request)
        })
    }

    /// Approves or rejects a pending request.
    ///
    /// Approving paid leave deducts its duration from the employee's balance
    /// in the same store write as the status change.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidState` if the request is not pending, if `status` is
    ///   `Pending`, or if approval would drive the balance negative
    pub fn set_status(&self, leave_id: Uuid, status: LeaveStatus) -> EngineResult<LeaveRequest> {
        if status == LeaveStatus::Pending {
            return Err(EngineError::invalid_state(
                "a request can only be approved or rejected",
            ));
        }
        let request = self.request(leave_id)?;

        self.locks.with_lock(request.employee_id.clone(), || {
            // Re-read under the lock so a concurrent decision is observed.
            let mut request = self.request(leave_id)?;
            if request.status != LeaveStatus::Pending {
                return Err(EngineError::invalid_state(format!(
                    "leave request {} is already {:?}",
                    leave_id, request.status
                )));
            }

            let mut previous_balance = None;
            let balance = if status == LeaveStatus::Approved && request.kind == LeaveKind::Paid {
                let employee = self.employee(&request.employee_id)?;
                previous_balance = Some(employee.leave_balance);
                let new_balance = employee.leave_balance - Decimal::from(request.duration_days());
                if new_balance.is_sign_negative() && !new_balance.is_zero() {
                    return Err(EngineError::invalid_state(format!(
                        "approving {} days would leave employee {} with a balance of {}",
                        request.duration_days(),
                        employee.id,
                        new_balance
                    )));
                }
                Some(BalanceUpdate {
                    employee_id: employee.id,
                    new_balance,
                })
            } else {
                None
            };

            self.store.record_decision(leave_id, status, balance.clone())?;
            request.status = status;

            match balance {
                Some(update) => info!(
                    leave_id = %leave_id,
                    employee_id = %update.employee_id,
                    previous_balance = ?previous_balance,
                    new_balance = %update.new_balance,
                    "Paid leave approved"
                ),
                None => info!(leave_id = %leave_id, status = ?status, "Leave request decided"),
            }
            Ok(request)
        })
    }

    /// Withdraws a pending request on behalf of its owner.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `InvalidState` if `by_employee_id` does not own the request or the
    ///   request is no longer pending
    pub fn cancel(&self, leave_id: Uuid, by_employee_id: &str) -> EngineResult<()> {
        let request = self.request(leave_id)?;
        if request.employee_id != by_employee_id {
            return Err(EngineError::invalid_state(format!(
                "leave request {} does not belong to employee {}",
                leave_id, by_employee_id
            )));
        }

        self.locks.with_lock(request.employee_id.clone(), || {
            let current = self.request(leave_id)?;
            if current.status != LeaveStatus::Pending {
                return Err(EngineError::invalid_state(format!(
                    "only pending requests can be cancelled, {} is {:?}",
                    leave_id, current.status
                )));
            }
            if !self.store.remove_leave(leave_id)? {
                return Err(EngineError::not_found("leave request", leave_id));
            }
            debug!(leave_id = %leave_id, employee_id = %by_employee_id, "Leave request cancelled");
            Ok(())
        })
    }

    /// A request by id.
    pub fn request(&self, leave_id: Uuid) -> EngineResult<LeaveRequest> {
        self.store
            .leave(leave_id)?
            .ok_or_else(|| EngineError::not_found("leave request", leave_id))
    }

    /// All requests of one employee, oldest first.
    pub fn requests_for(&self, employee_id: &str) -> EngineResult<Vec<LeaveRequest>> {
        self.employee(employee_id)?;
        self.store.leaves_for(employee_id)
    }

    /// Every request in the ledger, oldest first.
    pub fn all_requests(&self) -> EngineResult<Vec<LeaveRequest>> {
        self.store.all_leaves()
    }

    /// Every request currently in `status`, oldest first.
    pub fn requests_by_status(&self, status: LeaveStatus) -> EngineResult<Vec<LeaveRequest>> {
        Ok(self
            .store
            .all_leaves()?
            .into_iter()
            .filter(|leave| leave.status == status)
            .collect())
    }

    fn employee(&self, employee_id: &str) -> EngineResult<Employee> {
        self.store
            .employee(employee_id)?
            .ok_or_else(|| EngineError::not_found("employee", employee_id))
    }
}
