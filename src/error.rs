//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure a core operation can surface to its caller.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// Per-employee failures during run processing are not represented here:
/// they are counted and reported through [`crate::models::ProcessSummary`].
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "payroll run",
///     id: "42".to_string(),
/// };
/// assert_eq!(error.to_string(), "payroll run not found: 42");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A referenced employee, run, structure, item or leave request does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// An operation was attempted from a state that does not allow it.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// A description of the illegal transition.
        message: String,
    },

    /// The operation would duplicate or overlap an existing record.
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// A date range was empty, inverted or too long.
    #[error("Invalid range: {message}")]
    InvalidRange {
        /// A description of what made the range invalid.
        message: String,
    },

    /// A leave request overlaps a pending or approved request of the same employee.
    #[error("Leave for employee '{employee_id}' from {start} to {end} overlaps an existing request")]
    Overlap {
        /// The employee the request was made for.
        employee_id: String,
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// A paid leave request asks for more days than the employee has left.
    #[error("Insufficient paid leave balance: requested {requested} days, available {available} days")]
    InsufficientBalance {
        /// Requested number of days.
        requested: i64,
        /// The employee's current balance.
        available: Decimal,
    },

    /// Payroll data exists but is not yet visible to the caller.
    #[error("Not available: {message}")]
    NotAvailable {
        /// Why the data cannot be returned yet.
        message: String,
    },

    /// An input field failed validation.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A bonus policy payload could not be parsed.
    #[error("Invalid bonus policy: {message}")]
    InvalidBonusPolicy {
        /// A description of the parse failure.
        message: String,
    },

    /// A monetary calculation could not be completed.
    #[error("Calculation error: {message}")]
    Calculation {
        /// A description of the calculation error.
        message: String,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Returns a stable, machine-readable code for this error.
    ///
    /// ```
    /// use payroll_engine::error::EngineError;
    ///
    /// let error = EngineError::Conflict { message: "duplicate".to_string() };
    /// assert_eq!(error.code(), "CONFLICT");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::InvalidState { .. } => "INVALID_STATE",
            EngineError::Conflict { .. } => "CONFLICT",
            EngineError::InvalidRange { .. } => "INVALID_RANGE",
            EngineError::Overlap { .. } => "OVERLAP",
            EngineError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            EngineError::NotAvailable { .. } => "NOT_AVAILABLE",
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::InvalidBonusPolicy { .. } => "INVALID_BONUS_POLICY",
            EngineError::Calculation { .. } => "CALCULATION_ERROR",
            EngineError::Storage { .. } => "STORAGE_ERROR",
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = EngineError::not_found("employee", "emp_001");
        assert_eq!(error.to_string(), "employee not found: emp_001");
        assert_eq!(error.code(), "NOT_FOUND");
    }

    #[test]
    fn test_invalid_state_displays_message() {
        let error = EngineError::invalid_state("locked payrolls cannot be processed");
        assert_eq!(
            error.to_string(),
            "Invalid state: locked payrolls cannot be processed"
        );
    }

    #[test]
    fn test_overlap_displays_dates() {
        let error = EngineError::Overlap {
            employee_id: "emp_001".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 8, 3).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Leave for employee 'emp_001' from 2025-08-01 to 2025-08-03 overlaps an existing request"
        );
    }

    #[test]
    fn test_insufficient_balance_displays_requested_and_available() {
        let error = EngineError::InsufficientBalance {
            requested: 5,
            available: Decimal::from_str("3.00").unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Insufficient paid leave balance: requested 5 days, available 3.00 days"
        );
        assert_eq!(error.code(), "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn test_config_errors_share_code() {
        let missing = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        let bad = EngineError::ConfigParseError {
            path: "/config/engine.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(missing.code(), "CONFIG_ERROR");
        assert_eq!(bad.code(), "CONFIG_ERROR");
        assert_eq!(
            bad.to_string(),
            "Failed to parse configuration file '/config/engine.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_conflict() -> EngineResult<()> {
            Err(EngineError::Conflict {
                message: "run exists".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_conflict()?;
            Ok(())
        }

        assert_eq!(propagates_error().unwrap_err().code(), "CONFLICT");
    }
}
