//! Attendance API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{Attendance, AttendanceStatus, AttendanceSummary};
use shared::{ApiResponse, AppResult, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::AppState;
use crate::attendance::service;
use crate::auth::{CurrentUser, Permission};
use crate::db::AttendanceFilter;
use crate::utils::time::{business_date, current_month, validate_range};
use crate::utils::validation::validate_body;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ClockInRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn clock_in(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Option<Json<ClockInRequest>>,
) -> AppResult<Json<ApiResponse<Attendance>>> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    validate_body(&req)?;
    let record = service::clock_in(
        state.store(),
        &user.id,
        state.now(),
        state.config.business_timezone,
        req.notes,
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Clocked in successfully",
        record,
    )))
}

pub async fn clock_out(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Attendance>>> {
    let record = service::clock_out(
        state.store(),
        &user.id,
        state.now(),
        state.config.business_timezone,
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Clocked out successfully",
        record,
    )))
}

pub async fn start_break(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Attendance>>> {
    let record = service::start_break(
        state.store(),
        &user.id,
        state.now(),
        state.config.business_timezone,
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message("Break started", record)))
}

pub async fn end_break(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Attendance>>> {
    let record = service::end_break(
        state.store(),
        &user.id,
        state.now(),
        state.config.business_timezone,
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message("Break ended", record)))
}

/// All records, newest day first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Attendance>>>> {
    validate_range(query.start_date, query.end_date)?;
    let filter = AttendanceFilter {
        user_id: query.user_id,
        start_date: query.start_date,
        end_date: query.end_date,
        status: query.status,
        department_id: query.department_id,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let records = state.store.list_attendance(&filter, page).await?;
    Ok(Json(ApiResponse::success(records)))
}

/// Everyone's records for the current business day
pub async fn today(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Attendance>>>> {
    let day = business_date(state.now(), state.config.business_timezone);
    let mut records = state
        .store
        .find_attendance_range(&AttendanceFilter {
            start_date: Some(day),
            end_date: Some(day),
            ..Default::default()
        })
        .await?;
    records.sort_by_key(|r| r.clock_in);
    Ok(Json(ApiResponse::success(records)))
}

pub async fn user_records(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<Attendance>>>> {
    user.require_self_or(&id, Permission::AttendanceRead)?;
    validate_range(query.start_date, query.end_date)?;
    let records = state
        .store
        .find_attendance_range(&AttendanceFilter {
            user_id: Some(id),
            start_date: query.start_date,
            end_date: query.end_date,
            ..Default::default()
        })
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

/// Monthly summary; defaults to the current business month
pub async fn user_summary(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<ApiResponse<AttendanceSummary>>> {
    user.require_self_or(&id, Permission::AttendanceRead)?;
    let (year, month) = current_month(state.now(), state.config.business_timezone);
    let summary = service::monthly_summary(
        state.store(),
        &id,
        query.year.unwrap_or(year),
        query.month.unwrap_or(month),
    )
    .await?;
    Ok(Json(ApiResponse::success(summary)))
}
