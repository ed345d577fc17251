//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::EmployeeNotFound
            | Self::ProfileNotFound
            | Self::RoleNotFound
            | Self::AttendanceNotFound
            | Self::TimeEntryNotFound
            | Self::LeaveRequestNotFound
            | Self::LeaveTypeNotFound
            | Self::LeaveBalanceNotFound
            | Self::DepartmentNotFound
            | Self::ReviewNotFound
            | Self::GoalNotFound
            | Self::JobPostingNotFound
            | Self::CandidateNotFound
            | Self::ApplicationNotFound => StatusCode::NOT_FOUND,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountNotActive
            | Self::RefreshTokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::CannotChangeOwnRole
            | Self::RoleExceedsCaller => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request: validation, uniqueness and state-machine violations
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
