//! Leave API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use shared::models::{LeaveBalanceView, LeaveRequest, LeaveStatus, LeaveType};
use shared::{ApiResponse, AppResult, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::AppState;
use crate::auth::{CurrentUser, Permission};
use crate::db::LeaveRequestFilter;
use crate::leave::service::{self, LeaveRequestInput, LeaveTypeInput};
use crate::utils::time::business_date;
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestBody {
    #[validate(length(min = 1, message = "Leave type is required"))]
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 10, max = 1000, message = "Reason must be at least 10 characters"))]
    pub reason: String,
}

impl From<LeaveRequestBody> for LeaveRequestInput {
    fn from(body: LeaveRequestBody) -> Self {
        Self {
            leave_type_id: body.leave_type_id,
            start_date: body.start_date,
            end_date: body.end_date,
            reason: body.reason,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectBody {
    #[validate(length(max = 1000))]
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypeBody {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 366, message = "Max days per year must be between 0 and 366"))]
    pub max_days_per_year: i32,
    #[serde(default)]
    pub carry_forward: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<LeaveTypeBody> for LeaveTypeInput {
    fn from(body: LeaveTypeBody) -> Self {
        Self {
            name: body.name.trim().to_string(),
            description: body.description,
            max_days_per_year: body.max_days_per_year,
            carry_forward: body.carry_forward,
            is_active: body.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBody {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub leave_type_id: String,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(range(min = 0, max = 366))]
    pub allocated_days: i32,
}

#[derive(Debug, Deserialize)]
pub struct TypesQuery {
    /// Include deactivated types
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<LeaveStatus>,
    pub user_id: Option<String>,
    pub leave_type_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

fn current_year(state: &AppState) -> i32 {
    business_date(state.now(), state.config.business_timezone).year()
}

pub async fn list_types(
    State(state): State<AppState>,
    Query(query): Query<TypesQuery>,
) -> AppResult<Json<ApiResponse<Vec<LeaveType>>>> {
    let types = state.store.list_leave_types(query.all).await?;
    Ok(Json(ApiResponse::success(types)))
}

pub async fn create_type(
    State(state): State<AppState>,
    Json(body): Json<LeaveTypeBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<LeaveType>>)> {
    validate_body(&body)?;
    let leave_type =
        service::create_leave_type(state.store(), body.into(), state.now().timestamp_millis())
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Leave type created successfully",
            leave_type,
        )),
    ))
}

pub async fn update_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LeaveTypeBody>,
) -> AppResult<Json<ApiResponse<LeaveType>>> {
    validate_body(&body)?;
    let leave_type = service::update_leave_type(state.store(), &id, body.into()).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave type updated successfully",
        leave_type,
    )))
}

/// Callers without `leave.approve` only ever see their own requests
pub async fn list_requests(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<LeaveRequest>>>> {
    let user_id = if user.has_permission(Permission::LeaveApprove) {
        query.user_id
    } else {
        Some(user.id.clone())
    };
    let filter = LeaveRequestFilter {
        user_id,
        status: query.status,
        leave_type_id: query.leave_type_id,
        ..Default::default()
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let requests = state.store.list_leave_requests(&filter, page).await?;
    Ok(Json(ApiResponse::success(requests)))
}

pub async fn get_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let request = service::find_request(state.store(), &id).await?;
    user.require_self_or(&request.user_id, Permission::LeaveApprove)?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn create_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<LeaveRequestBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<LeaveRequest>>)> {
    validate_body(&body)?;
    let request = service::create_request(
        state.store(),
        &user.id,
        body.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Leave request submitted successfully",
            request,
        )),
    ))
}

pub async fn update_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<LeaveRequestBody>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    validate_body(&body)?;
    let request = service::update_request(
        state.store(),
        &user.id,
        &id,
        body.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave request updated successfully",
        request,
    )))
}

pub async fn cancel_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let request =
        service::cancel(state.store(), &user.id, &id, state.now().timestamp_millis()).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave request cancelled",
        request,
    )))
}

pub async fn approve_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let request = service::approve(
        state.store(),
        &user.id,
        &id,
        state.config.leave_balance_enforcement,
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave request approved successfully",
        request,
    )))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    validate_body(&body)?;
    let request = service::reject(
        state.store(),
        &id,
        body.comments,
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave request rejected",
        request,
    )))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    service::delete_request(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Leave request deleted successfully")))
}

/// All balances of a year (defaults to the current one)
pub async fn list_balances(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<ApiResponse<Vec<LeaveBalanceView>>>> {
    let year = query.year.unwrap_or_else(|| current_year(&state));
    let balances = service::balances(state.store(), None, year).await?;
    Ok(Json(ApiResponse::success(balances)))
}

pub async fn user_balances(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<ApiResponse<Vec<LeaveBalanceView>>>> {
    user.require_self_or(&id, Permission::LeaveApprove)?;
    let year = query.year.unwrap_or_else(|| current_year(&state));
    let balances = service::balances(state.store(), Some(&id), year).await?;
    Ok(Json(ApiResponse::success(balances)))
}

pub async fn set_allocation(
    State(state): State<AppState>,
    Json(body): Json<AllocationBody>,
) -> AppResult<Json<ApiResponse<LeaveBalanceView>>> {
    validate_body(&body)?;
    let balance = service::set_allocation(
        state.store(),
        &body.user_id,
        &body.leave_type_id,
        body.year,
        body.allocated_days,
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Leave allocation updated",
        balance,
    )))
}
