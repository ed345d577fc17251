//! Performance API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{Goal, GoalStatus, PerformanceOverview, PerformanceReview, ReviewStatus};
use shared::{ApiResponse, AppResult, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::AppState;
use crate::auth::{CurrentUser, Permission};
use crate::db::{GoalFilter, ReviewFilter};
use crate::performance::{self, GoalInput, ReviewInput};
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub review_period_start: NaiveDate,
    pub review_period_end: NaiveDate,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub overall_rating: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub goals_achievement: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub competency_rating: Option<i32>,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
    #[validate(length(max = 5000))]
    pub improvement_areas: Option<String>,
    pub status: Option<ReviewStatus>,
}

impl From<ReviewBody> for ReviewInput {
    fn from(body: ReviewBody) -> Self {
        Self {
            review_period_start: body.review_period_start,
            review_period_end: body.review_period_end,
            overall_rating: body.overall_rating,
            goals_achievement: body.goals_achievement,
            competency_rating: body.competency_rating,
            feedback: body.feedback,
            improvement_areas: body.improvement_areas,
            status: body.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewBody {
    #[validate(length(min = 1, message = "Employee is required"))]
    pub employee_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub review: ReviewBody,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoalBody {
    #[validate(length(min = 5, max = 200, message = "Goal title must be at least 5 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,
}

impl From<GoalBody> for GoalInput {
    fn from(body: GoalBody) -> Self {
        Self {
            title: body.title.trim().to_string(),
            description: body.description,
            target_date: body.target_date,
            status: body.status,
            progress: body.progress,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalBody {
    #[validate(length(min = 1, message = "User is required"))]
    pub user_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub goal: GoalBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub employee_id: Option<String>,
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalListQuery {
    pub user_id: Option<String>,
    pub status: Option<GoalStatus>,
}

/// Callers without `performance.manage` see only their own rows
fn narrow(user: &CurrentUser, requested: Option<String>) -> Option<String> {
    if user.has_permission(Permission::PerformanceManage) {
        requested
    } else {
        Some(user.id.clone())
    }
}

pub async fn list_reviews(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<PerformanceReview>>>> {
    let filter = ReviewFilter {
        employee_id: narrow(&user, query.employee_id),
        status: query.status,
        ..Default::default()
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let reviews = performance::list_reviews(state.store(), &filter, page).await?;
    Ok(Json(ApiResponse::success(reviews)))
}

pub async fn get_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<PerformanceReview>>> {
    let review = performance::find_review(state.store(), &id).await?;
    user.require_self_or(&review.employee_id, Permission::PerformanceManage)?;
    Ok(Json(ApiResponse::success(review)))
}

/// The caller becomes the reviewer
pub async fn create_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateReviewBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<PerformanceReview>>)> {
    validate_body(&body)?;
    let review = performance::create_review(
        state.store(),
        &body.employee_id,
        &user.id,
        body.review.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Performance review created successfully",
            review,
        )),
    ))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> AppResult<Json<ApiResponse<PerformanceReview>>> {
    validate_body(&body)?;
    let review =
        performance::update_review(state.store(), &id, body.into(), state.now().timestamp_millis())
            .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Performance review updated successfully",
        review,
    )))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    performance::delete_review(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Performance review deleted successfully")))
}

pub async fn list_goals(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<GoalListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Goal>>>> {
    let filter = GoalFilter {
        user_id: narrow(&user, query.user_id),
        status: query.status,
    };
    let goals = performance::list_goals(state.store(), &filter).await?;
    Ok(Json(ApiResponse::success(goals)))
}

pub async fn user_goals(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Goal>>>> {
    user.require_self_or(&user_id, Permission::PerformanceManage)?;
    let filter = GoalFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    let goals = performance::list_goals(state.store(), &filter).await?;
    Ok(Json(ApiResponse::success(goals)))
}

pub async fn get_goal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Goal>>> {
    let goal = performance::find_goal(state.store(), &id).await?;
    user.require_self_or(&goal.user_id, Permission::PerformanceManage)?;
    Ok(Json(ApiResponse::success(goal)))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(body): Json<CreateGoalBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<Goal>>)> {
    validate_body(&body)?;
    let goal = performance::create_goal(
        state.store(),
        &body.user_id,
        body.goal.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Goal created successfully", goal)),
    ))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GoalBody>,
) -> AppResult<Json<ApiResponse<Goal>>> {
    validate_body(&body)?;
    let goal =
        performance::update_goal(state.store(), &id, body.into(), state.now().timestamp_millis())
            .await?;
    Ok(Json(ApiResponse::success_with_message("Goal updated successfully", goal)))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    performance::delete_goal(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Goal deleted successfully")))
}

/// Year-to-date figures in the business timezone
pub async fn overview(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PerformanceOverview>>> {
    let overview =
        performance::overview(state.store(), state.now(), state.config.business_timezone).await?;
    Ok(Json(ApiResponse::success(overview)))
}
