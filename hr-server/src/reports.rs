//! Read-only aggregates for the reporting endpoints

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use shared::AppResult;
use shared::models::{
    AttendanceStatus, DepartmentHeadcount, LeaveRequest, LeaveStatus, PerformanceReview,
    ReviewStatus, UserStatus,
};

use crate::db::{AttendanceFilter, LeaveRequestFilter, Store, UserFilter};
use crate::departments;
use crate::utils::time::business_date;

/// Hire dates within this many days count as new hires
const NEW_HIRE_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTotals {
    pub total_requests: u64,
    pub approved_requests: u64,
    pub pending_requests: u64,
    pub rejected_requests: u64,
    pub cancelled_requests: u64,
    pub total_days_requested: i64,
    pub approved_days: i64,
}

pub fn leave_totals(requests: &[LeaveRequest]) -> LeaveTotals {
    let count = |status: LeaveStatus| requests.iter().filter(|r| r.status == status).count() as u64;
    LeaveTotals {
        total_requests: requests.len() as u64,
        approved_requests: count(LeaveStatus::Approved),
        pending_requests: count(LeaveStatus::Pending),
        rejected_requests: count(LeaveStatus::Rejected),
        cancelled_requests: count(LeaveStatus::Cancelled),
        total_days_requested: requests.iter().map(|r| i64::from(r.days_requested)).sum(),
        approved_days: requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Approved)
            .map(|r| i64::from(r.days_requested))
            .sum(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTotals {
    pub total_reviews: u64,
    pub completed_reviews: u64,
    /// Mean overall rating over rated reviews, 0 when none is rated
    pub average_rating: f64,
}

pub fn review_totals(reviews: &[PerformanceReview]) -> ReviewTotals {
    let ratings: Vec<f64> = reviews
        .iter()
        .filter_map(|r| r.overall_rating)
        .map(f64::from)
        .collect();
    ReviewTotals {
        total_reviews: reviews.len() as u64,
        completed_reviews: reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .count() as u64,
        average_rating: if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        },
    }
}

/// 人数统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadcountReport {
    pub total_employees: u64,
    pub active_employees: u64,
    pub inactive_employees: u64,
    /// Active employees per department
    pub departments: Vec<DepartmentHeadcount>,
}

pub async fn headcount(store: &dyn Store) -> AppResult<HeadcountReport> {
    let total_employees = store.count_users(&UserFilter::default()).await?;
    let active_employees = store
        .count_users(&UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        })
        .await?;
    Ok(HeadcountReport {
        total_employees,
        active_employees,
        inactive_employees: total_employees.saturating_sub(active_employees),
        departments: departments::headcount(store).await?,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Active accounts
    pub total_employees: u64,
    pub present_today: u64,
    /// Approved leave covering today
    pub on_leave: u64,
    pub pending_leaves: u64,
    pub new_hires: u64,
    /// present / total × 100, 0 without employees
    pub attendance_rate: f64,
}

pub async fn dashboard(store: &dyn Store, now: DateTime<Utc>, tz: Tz) -> AppResult<DashboardStats> {
    let today = business_date(now, tz);

    let total_employees = store
        .count_users(&UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        })
        .await?;
    let present_today = store
        .find_attendance_range(&AttendanceFilter {
            start_date: Some(today),
            end_date: Some(today),
            status: Some(AttendanceStatus::Present),
            ..Default::default()
        })
        .await?
        .len() as u64;
    let on_leave = store
        .find_leave_requests(&LeaveRequestFilter {
            status: Some(LeaveStatus::Approved),
            covering: Some(today),
            ..Default::default()
        })
        .await?
        .len() as u64;
    let pending_leaves = store
        .find_leave_requests(&LeaveRequestFilter {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        })
        .await?
        .len() as u64;
    let new_hires = store
        .count_users(&UserFilter {
            hired_since: today.checked_sub_days(Days::new(NEW_HIRE_WINDOW_DAYS)),
            ..Default::default()
        })
        .await?;

    let attendance_rate = if total_employees == 0 {
        0.0
    } else {
        present_today as f64 / total_employees as f64 * 100.0
    };

    Ok(DashboardStats {
        total_employees,
        present_today,
        on_leave,
        pending_leaves,
        new_hires,
        attendance_rate,
    })
}
