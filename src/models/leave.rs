//! Leave request models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DateRange;

/// The kind of leave being requested.
///
/// Only [`LeaveKind::Paid`] leave is backed by the employee's leave balance.
/// Approved sick and casual leave is unpaid and produces a salary deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// Balance-backed paid leave.
    Paid,
    /// Sick leave (unpaid).
    Sick,
    /// Casual leave (unpaid).
    Casual,
}

impl LeaveKind {
    /// Returns true if approved leave of this kind is deducted from salary.
    pub fn is_unpaid(self) -> bool {
        matches!(self, LeaveKind::Sick | LeaveKind::Casual)
    }
}

/// Lifecycle state of a leave request.
///
/// `Pending` is the only state that can change; `Approved` and `Rejected`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved by an administrator.
    Approved,
    /// Rejected by an administrator.
    Rejected,
}

impl LeaveStatus {
    /// Returns true if a request in this state blocks overlapping new requests.
    pub fn blocks_overlap(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

/// A request for leave by one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: Uuid,
    /// The employee who asked for the leave.
    pub employee_id: String,
    /// The kind of leave.
    pub kind: LeaveKind,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Current lifecycle state.
    pub status: LeaveStatus,
    /// Free-text reason supplied by the employee.
    #[serde(default)]
    pub reason: String,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// The leave interval as an inclusive date range.
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Number of calendar days requested, counting both ends.
    pub fn duration_days(&self) -> i64 {
        self.range().days()
    }

    /// Returns true if this is approved leave that reduces salary.
    pub fn is_approved_unpaid(&self) -> bool {
        self.status == LeaveStatus::Approved && self.kind.is_unpaid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: LeaveKind, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            kind,
            start_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 8, 5).unwrap(),
            status,
            reason: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duration_counts_both_ends() {
        assert_eq!(
            request(LeaveKind::Paid, LeaveStatus::Pending).duration_days(),
            5
        );
    }

    #[test]
    fn test_paid_leave_is_not_unpaid() {
        assert!(!LeaveKind::Paid.is_unpaid());
        assert!(LeaveKind::Sick.is_unpaid());
        assert!(LeaveKind::Casual.is_unpaid());
    }

    #[test]
    fn test_only_approved_sick_or_casual_reduces_salary() {
        assert!(request(LeaveKind::Sick, LeaveStatus::Approved).is_approved_unpaid());
        assert!(request(LeaveKind::Casual, LeaveStatus::Approved).is_approved_unpaid());
        assert!(!request(LeaveKind::Paid, LeaveStatus::Approved).is_approved_unpaid());
        assert!(!request(LeaveKind::Sick, LeaveStatus::Pending).is_approved_unpaid());
        assert!(!request(LeaveKind::Sick, LeaveStatus::Rejected).is_approved_unpaid());
    }

    #[test]
    fn test_rejected_requests_do_not_block_overlap() {
        assert!(LeaveStatus::Pending.blocks_overlap());
        assert!(LeaveStatus::Approved.blocks_overlap());
        assert!(!LeaveStatus::Rejected.blocks_overlap());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&LeaveKind::Casual).unwrap(), "\"casual\"");
    }
}
