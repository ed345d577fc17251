//! Time tracking handlers (caller's own entries only)

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::TimeEntry;
use shared::{ApiResponse, AppResult};
use validator::Validate;

use crate::AppState;
use crate::attendance::time_tracking::{self as entries, TimeEntryInput};
use crate::auth::CurrentUser;
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryRequest {
    #[validate(length(max = 100))]
    pub project_name: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Task description is required"))]
    pub task_description: String,
    /// Epoch millis
    pub start_time: i64,
    pub end_time: Option<i64>,
    #[serde(default)]
    pub billable: bool,
}

impl From<TimeEntryRequest> for TimeEntryInput {
    fn from(req: TimeEntryRequest) -> Self {
        Self {
            project_name: req.project_name,
            task_description: req.task_description,
            start_time: req.start_time,
            end_time: req.end_time,
            billable: req.billable,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub from: Option<i64>,
    pub until: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<TimeEntryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TimeEntry>>)> {
    validate_body(&req)?;
    let entry = entries::create(
        state.store(),
        &user.id,
        req.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Time entry created successfully",
            entry,
        )),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<TimeEntry>>>> {
    let list = entries::list(state.store(), &user.id, query.from, query.until).await?;
    Ok(Json(ApiResponse::success(list)))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<TimeEntry>>> {
    let entry = entries::find_owned(state.store(), &user.id, &id).await?;
    Ok(Json(ApiResponse::success(entry)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TimeEntryRequest>,
) -> AppResult<Json<ApiResponse<TimeEntry>>> {
    validate_body(&req)?;
    let entry = entries::update(
        state.store(),
        &user.id,
        &id,
        req.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Time entry updated successfully",
        entry,
    )))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    entries::delete(state.store(), &user.id, &id).await?;
    Ok(Json(ApiResponse::message("Time entry deleted successfully")))
}
