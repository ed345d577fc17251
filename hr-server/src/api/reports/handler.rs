//! Reports API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{Attendance, LeaveRequest, PerformanceReview};
use shared::{ApiResponse, AppResult};

use crate::AppState;
use crate::attendance::summary::{self, AttendanceTotals};
use crate::db::{AttendanceFilter, LeaveRequestFilter, ReviewFilter};
use crate::reports::{self, DashboardStats, HeadcountReport, LeaveTotals, ReviewTotals};
use crate::utils::time::validate_range;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<String>,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub leave_type_id: Option<String>,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report<T, S> {
    pub records: Vec<T>,
    pub summary: S,
}

pub async fn attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceReportQuery>,
) -> AppResult<Json<ApiResponse<Report<Attendance, AttendanceTotals>>>> {
    validate_range(query.start_date, query.end_date)?;
    let records = state
        .store
        .find_attendance_range(&AttendanceFilter {
            user_id: query.user_id,
            start_date: query.start_date,
            end_date: query.end_date,
            department_id: query.department_id,
            ..Default::default()
        })
        .await?;
    let summary = summary::totals(&records);
    Ok(Json(ApiResponse::success(Report { records, summary })))
}

/// Requests whose start date falls in the range
pub async fn leave(
    State(state): State<AppState>,
    Query(query): Query<LeaveReportQuery>,
) -> AppResult<Json<ApiResponse<Report<LeaveRequest, LeaveTotals>>>> {
    validate_range(query.start_date, query.end_date)?;
    let records = state
        .store
        .find_leave_requests(&LeaveRequestFilter {
            leave_type_id: query.leave_type_id,
            start_date: query.start_date,
            end_date: query.end_date,
            department_id: query.department_id,
            ..Default::default()
        })
        .await?;
    let summary = reports::leave_totals(&records);
    Ok(Json(ApiResponse::success(Report { records, summary })))
}

/// Reviews whose period starts in the range, latest period first
pub async fn performance(
    State(state): State<AppState>,
    Query(query): Query<PerformanceReportQuery>,
) -> AppResult<Json<ApiResponse<Report<PerformanceReview, ReviewTotals>>>> {
    validate_range(query.start_date, query.end_date)?;
    let mut records = state
        .store
        .find_reviews(&ReviewFilter {
            period_start_since: query.start_date,
            period_start_until: query.end_date,
            department_id: query.department_id,
            ..Default::default()
        })
        .await?;
    records.sort_by(|a, b| b.review_period_start.cmp(&a.review_period_start));
    let summary = reports::review_totals(&records);
    Ok(Json(ApiResponse::success(Report { records, summary })))
}

pub async fn headcount(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<HeadcountReport>>> {
    let report = reports::headcount(state.store()).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let stats =
        reports::dashboard(state.store(), state.now(), state.config.business_timezone).await?;
    Ok(Json(ApiResponse::success(stats)))
}
