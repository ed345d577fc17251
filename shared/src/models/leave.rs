//! Leave Model (请假)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Leave request status
///
/// `PENDING` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Leave type catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub max_days_per_year: i32,
    pub carry_forward: bool,
    pub is_active: bool,
    pub created_at: i64,
}

/// Per (user, leave type, year) allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveBalance {
    pub id: String,
    pub user_id: String,
    pub leave_type_id: String,
    pub year: i32,
    pub allocated_days: i32,
    pub used_days: i32,
    pub updated_at: i64,
}

impl LeaveBalance {
    pub fn remaining_days(&self) -> i32 {
        self.allocated_days - self.used_days
    }
}

/// Balance row joined with its leave type, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalanceView {
    pub user_id: String,
    pub leave_type_id: String,
    pub leave_type_name: String,
    pub year: i32,
    pub allocated_days: i32,
    pub used_days: i32,
    pub remaining_days: i32,
}

impl LeaveBalanceView {
    pub fn new(balance: &LeaveBalance, leave_type_name: impl Into<String>) -> Self {
        Self {
            user_id: balance.user_id.clone(),
            leave_type_id: balance.leave_type_id.clone(),
            leave_type_name: leave_type_name.into(),
            year: balance.year,
            allocated_days: balance.allocated_days,
            used_days: balance.used_days,
            remaining_days: balance.remaining_days(),
        }
    }
}

/// Leave request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: String,
    pub user_id: String,
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: i32,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<i64>,
    pub comments: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
        assert_eq!(LeaveStatus::from_db("CANCELLED"), Some(LeaveStatus::Cancelled));
        assert_eq!(
            serde_json::to_string(&LeaveStatus::Approved).unwrap(),
            "\"APPROVED\""
        );
    }

    #[test]
    fn test_balance_view_remaining() {
        let balance = LeaveBalance {
            id: "b1".into(),
            user_id: "u1".into(),
            leave_type_id: "t1".into(),
            year: 2025,
            allocated_days: 25,
            used_days: 7,
            updated_at: 0,
        };
        let view = LeaveBalanceView::new(&balance, "Annual Leave");
        assert_eq!(view.remaining_days, 18);
        assert_eq!(view.leave_type_name, "Annual Leave");
    }
}
