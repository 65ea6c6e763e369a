//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed settings deserialized from
//! `engine.yaml`.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

fn default_max_leave_days() -> i64 {
    30
}

fn default_parallel_processing() -> bool {
    true
}

fn default_backdate_warning_days() -> i64 {
    365
}

/// Engine-wide settings.
///
/// Every field has a default, so an empty `engine.yaml` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Longest leave request accepted, in days.
    #[serde(default = "default_max_leave_days")]
    pub max_leave_days: i64,
    /// Compute pay items for the roster in parallel.
    #[serde(default = "default_parallel_processing")]
    pub parallel_processing: bool,
    /// Size of a dedicated worker pool; `None` uses the global rayon pool.
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Salary structures starting further back than this are logged as
    /// back-dated.
    #[serde(default = "default_backdate_warning_days")]
    pub backdate_warning_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_leave_days: default_max_leave_days(),
            parallel_processing: default_parallel_processing(),
            worker_threads: None,
            backdate_warning_days: default_backdate_warning_days(),
        }
    }
}

impl EngineConfig {
    /// Checks that the settings are usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_leave_days < 1 {
            return Err(EngineError::Validation {
                field: "max_leave_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.worker_threads == Some(0) {
            return Err(EngineError::Validation {
                field: "worker_threads".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        if self.backdate_warning_days < 0 {
            return Err(EngineError::Validation {
                field: "backdate_warning_days".to_string(),
                message: "cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.max_leave_days, 30);
        assert!(config.parallel_processing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_zero_worker_threads_is_invalid() {
        let config = EngineConfig {
            worker_threads: Some(0),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("worker_threads"));
    }

    #[test]
    fn test_zero_max_leave_days_is_invalid() {
        let config = EngineConfig {
            max_leave_days: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
