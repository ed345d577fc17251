//! Attendance aggregation

use serde::Serialize;
use shared::models::{Attendance, AttendanceStatus, AttendanceSummary};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Monthly summary of one user's records
///
/// `absent = total - present`; the rate is 0 when there are no records.
pub fn summarize(year: i32, month: u32, records: &[Attendance]) -> AttendanceSummary {
    let total_days = records.len() as u64;
    let present_days = count_status(records, AttendanceStatus::Present);
    let late_days = count_status(records, AttendanceStatus::Late);
    let attendance_rate = if total_days == 0 {
        0.0
    } else {
        present_days as f64 / total_days as f64 * 100.0
    };

    AttendanceSummary {
        year,
        month,
        total_days,
        present_days,
        absent_days: total_days - present_days,
        late_days,
        total_hours: total_hours(records),
        attendance_rate,
    }
}

/// Totals over an arbitrary set of records (reports)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceTotals {
    pub total_records: u64,
    pub present_days: u64,
    pub absent_days: u64,
    pub late_days: u64,
    pub total_hours: f64,
}

pub fn totals(records: &[Attendance]) -> AttendanceTotals {
    AttendanceTotals {
        total_records: records.len() as u64,
        present_days: count_status(records, AttendanceStatus::Present),
        absent_days: count_status(records, AttendanceStatus::Absent),
        late_days: count_status(records, AttendanceStatus::Late),
        total_hours: total_hours(records),
    }
}

fn count_status(records: &[Attendance], status: AttendanceStatus) -> u64 {
    records.iter().filter(|r| r.status == status).count() as u64
}

fn total_hours(records: &[Attendance]) -> f64 {
    round2(records.iter().filter_map(|r| r.total_hours).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, status: AttendanceStatus, hours: Option<f64>) -> Attendance {
        Attendance {
            id: format!("a{day}"),
            user_id: "u1".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            clock_in: Some(0),
            clock_out: hours.map(|_| 1),
            break_started_at: None,
            break_duration: 0,
            total_hours: hours,
            status,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_empty_month_rate_is_zero() {
        let summary = summarize(2025, 6, &[]);
        assert_eq!(summary.total_days, 0);
        assert_eq!(summary.attendance_rate, 0.0);
        assert!(!summary.attendance_rate.is_nan());
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record(2, AttendanceStatus::Present, Some(8.0)),
            record(3, AttendanceStatus::Present, Some(7.5)),
            record(4, AttendanceStatus::Late, Some(6.25)),
            record(5, AttendanceStatus::Present, None),
        ];
        let summary = summarize(2025, 6, &records);
        assert_eq!(summary.total_days, 4);
        assert_eq!(summary.present_days, 3);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.late_days, 1);
        assert_eq!(summary.total_hours, 21.75);
        assert_eq!(summary.attendance_rate, 75.0);
    }

    #[test]
    fn test_totals() {
        let records = vec![
            record(2, AttendanceStatus::Present, Some(8.0)),
            record(3, AttendanceStatus::Absent, None),
        ];
        let t = totals(&records);
        assert_eq!(t.total_records, 2);
        assert_eq!(t.absent_days, 1);
        assert_eq!(t.total_hours, 8.0);
    }
}
