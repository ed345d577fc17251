//! Leave lifecycle and balance ledger

pub mod ledger;
pub mod lifecycle;
pub mod service;

use shared::models::LeaveStatus;
use shared::{AppError, ErrorCode};
use thiserror::Error;

pub use lifecycle::LeaveTransition;

/// Rejected leave operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("leave request not found")]
    RequestNotFound,
    #[error("leave type not found")]
    LeaveTypeNotFound,
    #[error("leave request is {0:?}, not pending")]
    NotPending(LeaveStatus),
    #[error("insufficient balance: requested {requested}, remaining {remaining}")]
    InsufficientBalance { requested: i32, remaining: i32 },
    #[error("start date after end date")]
    InvalidRange,
}

impl From<LeaveError> for AppError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::RequestNotFound => AppError::new(ErrorCode::LeaveRequestNotFound),
            LeaveError::LeaveTypeNotFound => AppError::new(ErrorCode::LeaveTypeNotFound),
            LeaveError::NotPending(status) => AppError::new(ErrorCode::LeaveNotPending)
                .with_detail("status", status.as_db()),
            LeaveError::InsufficientBalance {
                requested,
                remaining,
            } => AppError::new(ErrorCode::InsufficientBalance)
                .with_detail("requested", requested)
                .with_detail("remaining", remaining),
            LeaveError::InvalidRange => AppError::new(ErrorCode::InvalidLeaveRange),
        }
    }
}
