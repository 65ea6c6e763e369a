//! Salary structure and bonus policy models.
//!
//! A salary structure is one entry in an employee's compensation timeline:
//! an annual base salary and a bonus policy valid over an inclusive date
//! interval. An absent `effective_to` means the structure is open-ended.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// How the monthly bonus of a salary structure is derived.
///
/// Serialized adjacently tagged, e.g. `{"type": "percentage", "value": "10"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BonusPolicy {
    /// No bonus.
    #[default]
    None,
    /// A percentage of the monthly base salary.
    Percentage(Decimal),
    /// A fixed monthly amount.
    FixedAmount(Decimal),
}

impl BonusPolicy {
    /// Parses a bonus policy from a loosely-typed JSON payload.
    ///
    /// Accepts the tagged form produced by serializing [`BonusPolicy`] as
    /// well as the flat map shape used by HR frontends: `null` or `{}` for no
    /// bonus, `{"percentage": 10}`, `{"amount": 500}` or `{"fixed": 500}`.
    /// Values may be JSON numbers or numeric strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::BonusPolicy;
    /// use rust_decimal::Decimal;
    /// use serde_json::json;
    ///
    /// let policy = BonusPolicy::from_details(&json!({"percentage": 10})).unwrap();
    /// assert_eq!(policy, BonusPolicy::Percentage(Decimal::from(10)));
    ///
    /// assert!(BonusPolicy::from_details(&json!({"multiplier": 2})).is_err());
    /// ```
    pub fn from_details(details: &Value) -> EngineResult<Self> {
        let map = match details {
            Value::Null => return Ok(BonusPolicy::None),
            Value::Object(map) => map,
            other => {
                return Err(EngineError::InvalidBonusPolicy {
                    message: format!("expected an object, got {}", other),
                });
            }
        };

        if map.is_empty() {
            return Ok(BonusPolicy::None);
        }

        if map.contains_key("type") {
            return serde_json::from_value(details.clone()).map_err(|e| {
                EngineError::InvalidBonusPolicy {
                    message: e.to_string(),
                }
            });
        }

        if let Some(value) = map.get("percentage") {
            return parse_decimal("percentage", value).map(BonusPolicy::Percentage);
        }
        if let Some(value) = map.get("amount") {
            return parse_decimal("amount", value).map(BonusPolicy::FixedAmount);
        }
        if let Some(value) = map.get("fixed") {
            return parse_decimal("fixed", value).map(BonusPolicy::FixedAmount);
        }

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        Err(EngineError::InvalidBonusPolicy {
            message: format!("unrecognized keys: {}", keys.join(", ")),
        })
    }

    /// Like [`BonusPolicy::from_details`], but degrades malformed payloads to
    /// [`BonusPolicy::None`] with a warning instead of failing.
    pub fn from_details_lenient(details: &Value) -> Self {
        match Self::from_details(details) {
            Ok(policy) => policy,
            Err(err) => {
                warn!(error = %err, "Malformed bonus details, treating as no bonus");
                BonusPolicy::None
            }
        }
    }
}

fn parse_decimal(key: &str, value: &Value) -> EngineResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string())),
        Value::String(s) => Decimal::from_str(s.trim()),
        other => {
            return Err(EngineError::InvalidBonusPolicy {
                message: format!("'{}' must be numeric, got {}", key, other),
            });
        }
    };
    parsed.map_err(|e| EngineError::InvalidBonusPolicy {
        message: format!("'{}' is not a decimal: {}", key, e),
    })
}

/// One entry in an employee's compensation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// Unique identifier for the structure.
    pub id: Uuid,
    /// The employee this structure belongs to.
    pub employee_id: String,
    /// Annual base salary.
    pub base_salary: Decimal,
    /// Bonus policy applied on top of the monthly base.
    #[serde(default)]
    pub bonus_policy: BonusPolicy,
    /// First day the structure applies (inclusive).
    pub effective_from: NaiveDate,
    /// Last day the structure applies (inclusive); `None` means open-ended.
    pub effective_to: Option<NaiveDate>,
    /// When the structure was recorded.
    pub created_at: DateTime<Utc>,
}

impl SalaryStructure {
    /// Returns true if the structure has no end date.
    pub fn is_open_ended(&self) -> bool {
        self.effective_to.is_none()
    }

    /// Returns true if `date` lies within the structure's validity interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{BonusPolicy, SalaryStructure};
    /// use chrono::{NaiveDate, Utc};
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let structure = SalaryStructure {
    ///     id: Uuid::new_v4(),
    ///     employee_id: "emp_001".to_string(),
    ///     base_salary: Decimal::from(120_000),
    ///     bonus_policy: BonusPolicy::None,
    ///     effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    ///     effective_to: None,
    ///     created_at: Utc::now(),
    /// };
    /// assert!(structure.is_effective_on(NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()));
    /// assert!(!structure.is_effective_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
    /// ```
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if this structure's interval shares a day with
    /// `[from, to]`, treating a missing end on either side as unbounded.
    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        let starts_before_other_ends = to.is_none_or(|to| self.effective_from <= to);
        let ends_after_other_starts = self.effective_to.is_none_or(|own_to| own_to >= from);
        starts_before_other_ends && ends_after_other_starts
    }
}

/// The editable fields of a salary structure.
///
/// Used both to assign a new structure and to replace the fields of an
/// existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTerms {
    /// Annual base salary; must be positive.
    pub base_salary: Decimal,
    /// Bonus policy.
    #[serde(default)]
    pub bonus_policy: BonusPolicy,
    /// First day the structure applies (inclusive).
    pub effective_from: NaiveDate,
    /// Last day the structure applies (inclusive); must be after `effective_from`.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}
