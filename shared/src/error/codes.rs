//! Unified error codes for the HR backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 8xxx: Employee / identity errors
//! - 9xxx: System errors
//! - 10xxx: Attendance errors
//! - 11xxx: Leave errors
//! - 12xxx: Performance errors
//! - 13xxx: Recruitment errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account exists but is not ACTIVE
    AccountNotActive = 1007,
    /// Refresh token rejected
    RefreshTokenInvalid = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Caller tried to change their own role
    CannotChangeOwnRole = 2003,
    /// Target role grants more than the caller holds
    RoleExceedsCaller = 2004,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Email or employee id already registered
    DuplicateIdentity = 8002,
    /// Cannot deactivate own account
    EmployeeCannotDeleteSelf = 8003,
    /// Profile not found
    ProfileNotFound = 8004,
    /// Role not found
    RoleNotFound = 8101,
    /// Department not found
    DepartmentNotFound = 8201,
    /// Department name already exists
    DepartmentNameExists = 8202,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 10xxx: Attendance ====================
    /// Attendance record not found
    AttendanceNotFound = 10001,
    /// Already clocked in today
    AlreadyClockedIn = 10002,
    /// No clock-in record for today
    NoClockInRecord = 10003,
    /// Already clocked out today
    AlreadyClockedOut = 10004,
    /// A break is already running
    AlreadyOnBreak = 10005,
    /// No break is running
    NotOnBreak = 10006,
    /// Record changed concurrently
    AttendanceConflict = 10007,
    /// Time entry not found
    TimeEntryNotFound = 10101,
    /// End time precedes start time
    InvalidTimeRange = 10102,

    // ==================== 11xxx: Leave ====================
    /// Leave request not found
    LeaveRequestNotFound = 11001,
    /// Leave request is no longer pending
    LeaveNotPending = 11002,
    /// Not enough leave balance
    InsufficientBalance = 11003,
    /// Start date after end date
    InvalidLeaveRange = 11004,
    /// Leave type not found
    LeaveTypeNotFound = 11101,
    /// Leave type name already exists
    LeaveTypeNameExists = 11102,
    /// Leave type is inactive
    LeaveTypeInactive = 11103,
    /// Leave balance not found
    LeaveBalanceNotFound = 11201,

    // ==================== 12xxx: Performance ====================
    /// Performance review not found
    ReviewNotFound = 12001,
    /// Review period start after end
    InvalidReviewPeriod = 12002,
    /// Goal not found
    GoalNotFound = 12101,

    // ==================== 13xxx: Recruitment ====================
    /// Job posting not found
    JobPostingNotFound = 13001,
    /// Job posting is not accepting applications
    JobPostingNotOpen = 13002,
    /// Candidate not found
    CandidateNotFound = 13101,
    /// Candidate email already registered
    CandidateEmailExists = 13102,
    /// Application not found
    ApplicationNotFound = 13201,
    /// Candidate already applied to this posting
    DuplicateApplication = 13202,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::AccountNotActive => {
                "Account is not active. Please contact administrator."
            }
            ErrorCode::RefreshTokenInvalid => "Invalid refresh token",

            // Permission
            ErrorCode::PermissionDenied => "Insufficient permissions",
            ErrorCode::RoleRequired => "Access denied. Insufficient role.",
            ErrorCode::CannotChangeOwnRole => "Cannot change your own role",
            ErrorCode::RoleExceedsCaller => {
                "Cannot assign a role with permissions you do not hold"
            }

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::DuplicateIdentity => {
                "User with this email or employee ID already exists"
            }
            ErrorCode::EmployeeCannotDeleteSelf => "Cannot deactivate own account",
            ErrorCode::ProfileNotFound => "Profile not found",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::DepartmentNotFound => "Department not found",
            ErrorCode::DepartmentNameExists => "Department name already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",

            // Attendance
            ErrorCode::AttendanceNotFound => "Attendance record not found",
            ErrorCode::AlreadyClockedIn => "Already clocked in today",
            ErrorCode::NoClockInRecord => "No clock-in record found for today",
            ErrorCode::AlreadyClockedOut => "Already clocked out today",
            ErrorCode::AlreadyOnBreak => "Break already started",
            ErrorCode::NotOnBreak => "No break in progress",
            ErrorCode::AttendanceConflict => "Attendance record was modified concurrently",
            ErrorCode::TimeEntryNotFound => "Time entry not found",
            ErrorCode::InvalidTimeRange => "End time must not be before start time",

            // Leave
            ErrorCode::LeaveRequestNotFound => "Leave request not found",
            ErrorCode::LeaveNotPending => "Leave request is not pending",
            ErrorCode::InsufficientBalance => "Insufficient leave balance",
            ErrorCode::InvalidLeaveRange => "Start date must not be after end date",
            ErrorCode::LeaveTypeNotFound => "Leave type not found",
            ErrorCode::LeaveTypeNameExists => "Leave type name already exists",
            ErrorCode::LeaveTypeInactive => "Leave type is inactive",
            ErrorCode::LeaveBalanceNotFound => "Leave balance not found",

            // Performance
            ErrorCode::ReviewNotFound => "Performance review not found",
            ErrorCode::InvalidReviewPeriod => "Review period start must not be after its end",
            ErrorCode::GoalNotFound => "Goal not found",

            // Recruitment
            ErrorCode::JobPostingNotFound => "Job posting not found",
            ErrorCode::JobPostingNotOpen => "Job posting is not accepting applications",
            ErrorCode::CandidateNotFound => "Candidate not found",
            ErrorCode::CandidateEmailExists => "Candidate with this email already exists",
            ErrorCode::ApplicationNotFound => "Application not found",
            ErrorCode::DuplicateApplication => "Candidate already applied to this job posting",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountNotActive),
            1008 => Ok(ErrorCode::RefreshTokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::CannotChangeOwnRole),
            2004 => Ok(ErrorCode::RoleExceedsCaller),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8002 => Ok(ErrorCode::DuplicateIdentity),
            8003 => Ok(ErrorCode::EmployeeCannotDeleteSelf),
            8004 => Ok(ErrorCode::ProfileNotFound),
            8101 => Ok(ErrorCode::RoleNotFound),
            8201 => Ok(ErrorCode::DepartmentNotFound),
            8202 => Ok(ErrorCode::DepartmentNameExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            // Attendance
            10001 => Ok(ErrorCode::AttendanceNotFound),
            10002 => Ok(ErrorCode::AlreadyClockedIn),
            10003 => Ok(ErrorCode::NoClockInRecord),
            10004 => Ok(ErrorCode::AlreadyClockedOut),
            10005 => Ok(ErrorCode::AlreadyOnBreak),
            10006 => Ok(ErrorCode::NotOnBreak),
            10007 => Ok(ErrorCode::AttendanceConflict),
            10101 => Ok(ErrorCode::TimeEntryNotFound),
            10102 => Ok(ErrorCode::InvalidTimeRange),

            // Leave
            11001 => Ok(ErrorCode::LeaveRequestNotFound),
            11002 => Ok(ErrorCode::LeaveNotPending),
            11003 => Ok(ErrorCode::InsufficientBalance),
            11004 => Ok(ErrorCode::InvalidLeaveRange),
            11101 => Ok(ErrorCode::LeaveTypeNotFound),
            11102 => Ok(ErrorCode::LeaveTypeNameExists),
            11103 => Ok(ErrorCode::LeaveTypeInactive),
            11201 => Ok(ErrorCode::LeaveBalanceNotFound),

            // Performance
            12001 => Ok(ErrorCode::ReviewNotFound),
            12002 => Ok(ErrorCode::InvalidReviewPeriod),
            12101 => Ok(ErrorCode::GoalNotFound),

            // Recruitment
            13001 => Ok(ErrorCode::JobPostingNotFound),
            13002 => Ok(ErrorCode::JobPostingNotOpen),
            13101 => Ok(ErrorCode::CandidateNotFound),
            13102 => Ok(ErrorCode::CandidateEmailExists),
            13201 => Ok(ErrorCode::ApplicationNotFound),
            13202 => Ok(ErrorCode::DuplicateApplication),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::DuplicateIdentity.code(), 8002);
        assert_eq!(ErrorCode::AlreadyClockedIn.code(), 10002);
        assert_eq!(ErrorCode::InsufficientBalance.code(), 11003);
    }

    #[test]
    fn test_try_from_known_and_unknown() {
        assert_eq!(ErrorCode::try_from(10004), Ok(ErrorCode::AlreadyClockedOut));
        assert_eq!(ErrorCode::try_from(11002), Ok(ErrorCode::LeaveNotPending));
        assert_eq!(ErrorCode::try_from(13202), Ok(ErrorCode::DuplicateApplication));
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::NoClockInRecord).unwrap();
        assert_eq!(json, "10003");
        let parsed: ErrorCode = serde_json::from_str("1007").unwrap();
        assert_eq!(parsed, ErrorCode::AccountNotActive);
        assert!(serde_json::from_str::<ErrorCode>("65000").is_err());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ErrorCode::InvalidCredentials.message(),
            "Invalid email or password"
        );
        assert_eq!(
            ErrorCode::AccountNotActive.message(),
            "Account is not active. Please contact administrator."
        );
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
