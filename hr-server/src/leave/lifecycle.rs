//! Leave request lifecycle
//!
//! `PENDING -> {APPROVED, REJECTED, CANCELLED}`; every other state is terminal.

use chrono::NaiveDate;
use shared::models::{LeaveRequest, LeaveStatus};

use super::LeaveError;

/// Requested transition of a pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveTransition {
    Approve {
        approver_id: String,
        /// Debit the (user, type, start year) balance in the same unit
        enforce_balance: bool,
    },
    Reject {
        comments: Option<String>,
    },
    Cancel,
}

impl LeaveTransition {
    pub fn target(&self) -> LeaveStatus {
        match self {
            Self::Approve { .. } => LeaveStatus::Approved,
            Self::Reject { .. } => LeaveStatus::Rejected,
            Self::Cancel => LeaveStatus::Cancelled,
        }
    }
}

/// Inclusive day count; same-day leave is one day
pub fn days_requested(start: NaiveDate, end: NaiveDate) -> Result<i32, LeaveError> {
    if start > end {
        return Err(LeaveError::InvalidRange);
    }
    Ok((end - start).num_days() as i32 + 1)
}

/// Next state of `request` under `transition`
pub fn apply(
    request: &LeaveRequest,
    transition: &LeaveTransition,
    now_ms: i64,
) -> Result<LeaveRequest, LeaveError> {
    ensure_pending(request)?;
    let mut next = request.clone();
    next.status = transition.target();
    next.updated_at = now_ms;
    match transition {
        LeaveTransition::Approve { approver_id, .. } => {
            next.approved_by = Some(approver_id.clone());
            next.approved_at = Some(now_ms);
        }
        LeaveTransition::Reject { comments } => {
            next.comments = comments.clone();
        }
        LeaveTransition::Cancel => {}
    }
    Ok(next)
}

/// Owner edits are only allowed while pending
pub fn ensure_pending(request: &LeaveRequest) -> Result<(), LeaveError> {
    if request.status.is_terminal() {
        return Err(LeaveError::NotPending(request.status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn pending() -> LeaveRequest {
        LeaveRequest {
            id: "r1".into(),
            user_id: "u1".into(),
            leave_type_id: "t1".into(),
            start_date: date(7),
            end_date: date(11),
            days_requested: 5,
            reason: "Family vacation".into(),
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            comments: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_days_requested_inclusive() {
        assert_eq!(days_requested(date(1), date(1)), Ok(1));
        assert_eq!(days_requested(date(1), date(7)), Ok(7));
        assert_eq!(
            days_requested(date(8), date(7)),
            Err(LeaveError::InvalidRange)
        );
    }

    #[test]
    fn test_days_requested_across_month() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert_eq!(days_requested(start, end), Ok(4));
    }

    #[test]
    fn test_approve_records_approver() {
        let next = apply(
            &pending(),
            &LeaveTransition::Approve {
                approver_id: "m1".into(),
                enforce_balance: false,
            },
            42,
        )
        .unwrap();
        assert_eq!(next.status, LeaveStatus::Approved);
        assert_eq!(next.approved_by.as_deref(), Some("m1"));
        assert_eq!(next.approved_at, Some(42));
    }

    #[test]
    fn test_reject_stores_comments_only() {
        let next = apply(
            &pending(),
            &LeaveTransition::Reject {
                comments: Some("Quarter close".into()),
            },
            42,
        )
        .unwrap();
        assert_eq!(next.status, LeaveStatus::Rejected);
        assert_eq!(next.comments.as_deref(), Some("Quarter close"));
        assert_eq!(next.approved_by, None);
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        for status in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            let mut req = pending();
            req.status = status;
            assert_eq!(
                apply(&req, &LeaveTransition::Cancel, 1),
                Err(LeaveError::NotPending(status))
            );
        }
    }
}
