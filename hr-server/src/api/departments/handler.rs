//! Departments API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::Department;
use shared::{ApiResponse, AppResult};
use validator::Validate;

use crate::AppState;
use crate::departments::{self, DepartmentInput};
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize, Validate)]
pub struct DepartmentBody {
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Budget must not be negative"))]
    pub budget: Option<f64>,
}

impl From<DepartmentBody> for DepartmentInput {
    fn from(body: DepartmentBody) -> Self {
        Self {
            name: body.name.trim().to_string(),
            description: body.description,
            budget: body.budget,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Department>>>> {
    let list = state.store.list_departments().await?;
    Ok(Json(ApiResponse::success(list)))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let department = departments::find(state.store(), &id).await?;
    Ok(Json(ApiResponse::success(department)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<DepartmentBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<Department>>)> {
    validate_body(&body)?;
    let department =
        departments::create(state.store(), body.into(), state.now().timestamp_millis()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Department created successfully",
            department,
        )),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DepartmentBody>,
) -> AppResult<Json<ApiResponse<Department>>> {
    validate_body(&body)?;
    let department = departments::update(state.store(), &id, body.into()).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Department updated successfully",
        department,
    )))
}
