//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 8xxx: Employee errors
/// - 10xxx: Attendance errors
/// - 11xxx: Leave errors
/// - 12xxx: Performance errors
/// - 13xxx: Recruitment errors
/// - everything else: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Employee errors (8xxx)
    Employee,
    /// Attendance errors (10xxx)
    Attendance,
    /// Leave errors (11xxx)
    Leave,
    /// Performance errors (12xxx)
    Performance,
    /// Recruitment errors (13xxx)
    Recruitment,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            8000..9000 => Self::Employee,
            10000..11000 => Self::Attendance,
            11000..12000 => Self::Leave,
            12000..13000 => Self::Performance,
            13000..14000 => Self::Recruitment,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Employee => "employee",
            Self::Attendance => "attendance",
            Self::Leave => "leave",
            Self::Performance => "performance",
            Self::Recruitment => "recruitment",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::Employee);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10002), ErrorCategory::Attendance);
        assert_eq!(ErrorCategory::from_code(11003), ErrorCategory::Leave);
        assert_eq!(ErrorCategory::from_code(12001), ErrorCategory::Performance);
        assert_eq!(ErrorCategory::from_code(13202), ErrorCategory::Recruitment);
        assert_eq!(ErrorCategory::from_code(14000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::RoleRequired.category(), ErrorCategory::Permission);
        assert_eq!(ErrorCode::NotOnBreak.category(), ErrorCategory::Attendance);
        assert_eq!(ErrorCode::LeaveNotPending.category(), ErrorCategory::Leave);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
        assert_eq!(ErrorCategory::Attendance.name(), "attendance");
    }
}
