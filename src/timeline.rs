//! Salary timeline management.
//!
//! Each employee has an ordered, non-overlapping sequence of salary
//! structures. [`SalaryTimeline`] is the only writer of that sequence and
//! keeps two invariants for every employee:
//!
//! - no two structures share a day, with a missing end date treated as
//!   unbounded;
//! - consequently, at most one structure is open-ended.
//!
//! Assigning a new structure closes any open-ended structure that started
//! earlier on the day before the new one begins.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{SalaryStructure, StructureTerms};
use crate::store::{Clock, EmployeeRoster, SalaryStructureStore};
use crate::sync::KeyedLocks;

/// Maintains each employee's salary structure timeline.
pub struct SalaryTimeline<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: KeyedLocks<String>,
}

impl<S> SalaryTimeline<S>
where
    S: EmployeeRoster + SalaryStructureStore + ?Sized,
{
    /// Creates a timeline manager over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Assigns a new salary structure to an employee.
    ///
    /// Open-ended structures that start before `terms.effective_from` are
    /// closed on the previous day. The whole change is validated before
    /// anything is written, so a failed assignment leaves the timeline as it
    /// was.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the employee does not exist
    /// - `Validation` if the base salary is not positive
    /// - `InvalidRange` if `effective_to` is not after `effective_from`
    /// - `Conflict` if the new interval would still overlap another structure
    pub fn assign(
        &self,
        employee_id: &str,
        terms: StructureTerms,
    ) -> EngineResult<SalaryStructure> {
        self.require_employee(employee_id)?;
        validate_terms(&terms)?;
        self.warn_if_backdated(employee_id, terms.effective_from);

        self.locks.with_lock(employee_id.to_string(), || {
            let existing = self.store.structures_for(employee_id)?;

            let to_close: Vec<Uuid> = existing
                .iter()
                .filter(|s| s.is_open_ended() && s.effective_from < terms.effective_from)
                .map(|s| s.id)
                .collect();
            let closed_to = terms
                .effective_from
                .pred_opt()
                .ok_or_else(|| EngineError::InvalidRange {
                    message: format!("no day precedes {}", terms.effective_from),
                })?;

            for other in &existing {
                let mut after_close = other.clone();
                if to_close.contains(&other.id) {
                    after_close.effective_to = Some(closed_to);
                }
                if after_close.overlaps(terms.effective_from, terms.effective_to) {
                    return Err(overlap_conflict(&after_close));
                }
            }

            let structure = SalaryStructure {
                id: Uuid::new_v4(),
                employee_id: employee_id.to_string(),
                base_salary: terms.base_salary,
                bonus_policy: terms.bonus_policy.clone(),
                effective_from: terms.effective_from,
                effective_to: terms.effective_to,
                created_at: self.clock.now(),
            };
            self.store
                .assign_structure(&to_close, closed_to, structure.clone())?;

            info!(
                employee_id = %employee_id,
                structure_id = %structure.id,
                effective_from = %structure.effective_from,
                closed = to_close.len(),
                "Salary structure assigned"
            );
            Ok(structure)
        })
    }

    /// Returns the structure whose interval contains `on`.
    ///
    /// Fails with `NotFound` if no structure covers that date.
    pub fn active_structure_for(
        &self,
        employee_id: &str,
        on: NaiveDate,
    ) -> EngineResult<SalaryStructure> {
        self.store
            .active_structure(employee_id, on)?
            .ok_or_else(|| {
                EngineError::not_found("salary structure", format!("{} on {}", employee_id, on))
            })
    }

    /// Returns the structure in effect today.
    pub fn current_structure(&self, employee_id: &str) -> EngineResult<SalaryStructure> {
        self.require_employee(employee_id)?;
        self.active_structure_for(employee_id, self.clock.today())
    }

    /// Looks up a structure by id.
    pub fn structure(&self, structure_id: Uuid) -> EngineResult<SalaryStructure> {
        self.store
            .structure(structure_id)?
            .ok_or_else(|| EngineError::not_found("salary structure", structure_id))
    }

    /// Replaces the terms of an existing structure.
    ///
    /// The new interval is checked against every other structure of the same
    /// employee; the structure being updated is excluded from the check.
    pub fn update(
        &self,
        structure_id: Uuid,
        terms: StructureTerms,
    ) -> EngineResult<SalaryStructure> {
        let current = self.structure(structure_id)?;
        validate_terms(&terms)?;

        self.locks.with_lock(current.employee_id.clone(), || {
            let others = self.store.structures_for(&current.employee_id)?;
            if let Some(clash) = others
                .iter()
                .filter(|s| s.id != structure_id)
                .find(|s| s.overlaps(terms.effective_from, terms.effective_to))
            {
                return Err(overlap_conflict(clash));
            }

            let updated = SalaryStructure {
                base_salary: terms.base_salary,
                bonus_policy: terms.bonus_policy.clone(),
                effective_from: terms.effective_from,
                effective_to: terms.effective_to,
                ..current.clone()
            };
            self.store.update_structure(updated.clone())?;
            info!(structure_id = %structure_id, "Salary structure updated");
            Ok(updated)
        })
    }

    /// Deletes a structure.
    pub fn remove(&self, structure_id: Uuid) -> EngineResult<()> {
        if !self.store.remove_structure(structure_id)? {
            return Err(EngineError::not_found("salary structure", structure_id));
        }
        info!(structure_id = %structure_id, "Salary structure removed");
        Ok(())
    }

    /// All structures of an employee, newest `effective_from` first.
    pub fn history(&self, employee_id: &str) -> EngineResult<Vec<SalaryStructure>> {
        self.require_employee(employee_id)?;
        let mut structures = self.store.structures_for(employee_id)?;
        structures.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
        Ok(structures)
    }

    fn require_employee(&self, employee_id: &str) -> EngineResult<()> {
        match self.store.employee(employee_id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("employee", employee_id)),
        }
    }

    fn warn_if_backdated(&self, employee_id: &str, effective_from: NaiveDate) {
        let days = u64::try_from(self.config.backdate_warning_days).unwrap_or(0);
        let Some(threshold) = self.clock.today().checked_sub_days(Days::new(days)) else {
            return;
        };
        if effective_from < threshold {
            warn!(
                employee_id = %employee_id,
                effective_from = %effective_from,
                "Salary structure is back-dated beyond the warning threshold"
            );
        }
    }
}

fn validate_terms(terms: &StructureTerms) -> EngineResult<()> {
    if terms.base_salary.is_sign_negative() || terms.base_salary.is_zero() {
        return Err(EngineError::Validation {
            field: "base_salary".to_string(),
            message: format!("must be positive, got {}", terms.base_salary),
        });
    }
    if let Some(to) = terms.effective_to {
        if to <= terms.effective_from {
            return Err(EngineError::InvalidRange {
                message: format!(
                    "effective_to {} must be after effective_from {}",
                    to, terms.effective_from
                ),
            });
        }
    }
    Ok(())
}

fn overlap_conflict(existing: &SalaryStructure) -> EngineError {
    let to = existing
        .effective_to
        .map(|d| d.to_string())
        .unwrap_or_else(|| "open".to_string());
    EngineError::Conflict {
        message: format!(
            "dates overlap salary structure {} ({} to {})",
            existing.id, existing.effective_from, to
        ),
    }
}
