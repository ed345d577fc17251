//! Attendance Model (考勤)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance status of a day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PRESENT" => Some(Self::Present),
            "ABSENT" => Some(Self::Absent),
            "LATE" => Some(Self::Late),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
        }
    }
}

/// One row per (user, business day)
///
/// Timestamps are UTC epoch milliseconds. `break_duration` is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub clock_in: Option<i64>,
    pub clock_out: Option<i64>,
    /// Start of the running break, if any
    pub break_started_at: Option<i64>,
    pub break_duration: i32,
    pub total_hours: Option<f64>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Monthly attendance aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub year: i32,
    pub month: u32,
    pub total_days: u64,
    pub present_days: u64,
    pub absent_days: u64,
    pub late_days: u64,
    pub total_hours: f64,
    pub attendance_rate: f64,
}
