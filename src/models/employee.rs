//! Employee model.
//!
//! The employee record itself is owned by the surrounding HR system; the
//! payroll core only reads the identity and reads or writes the leave balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents an employee on the payroll roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name, used only for log messages.
    #[serde(default)]
    pub name: String,
    /// Remaining paid leave in days (two fraction digits, never negative).
    pub leave_balance: Decimal,
}

impl Employee {
    /// Creates an employee with the given paid leave balance.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::Employee;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee::new("emp_001", "Ada Lovelace", Decimal::new(1200, 2));
    /// assert!(employee.can_take_paid_days(12));
    /// assert!(!employee.can_take_paid_days(13));
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, leave_balance: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            leave_balance,
        }
    }

    /// Returns true if the balance covers `days` of paid leave.
    pub fn can_take_paid_days(&self, days: i64) -> bool {
        self.leave_balance >= Decimal::from(days)
    }
}
