//! Attendance tracking: day state machine, aggregation, service

pub mod machine;
pub mod service;
pub mod summary;
pub mod time_tracking;

use shared::{AppError, ErrorCode};

pub use machine::{AttendanceError, DayState};

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        let code = match err {
            AttendanceError::AlreadyClockedIn => ErrorCode::AlreadyClockedIn,
            AttendanceError::NoClockInRecord => ErrorCode::NoClockInRecord,
            AttendanceError::AlreadyClockedOut => ErrorCode::AlreadyClockedOut,
            AttendanceError::AlreadyOnBreak => ErrorCode::AlreadyOnBreak,
            AttendanceError::NotOnBreak => ErrorCode::NotOnBreak,
        };
        AppError::new(code)
    }
}
