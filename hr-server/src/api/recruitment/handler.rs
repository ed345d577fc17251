//! Recruitment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{
    Application, ApplicationStatus, Candidate, EmploymentType, JobPosting, JobStatus,
    PipelineStage, RecruitmentMetrics,
};
use shared::{ApiResponse, AppResult, PageQuery, PaginatedResponse};
use validator::Validate;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::db::{ApplicationFilter, JobPostingFilter};
use crate::recruitment::{self, CandidateInput, JobPostingInput};
use crate::utils::serde_helpers;
use crate::utils::validation::validate_body;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingBody {
    #[validate(length(min = 5, max = 200, message = "Job title must be at least 5 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department_id: String,
    #[validate(length(
        min = 50,
        max = 10000,
        message = "Job description must be at least 50 characters"
    ))]
    pub description: String,
    #[validate(length(max = 5000))]
    pub requirements: Option<String>,
    #[validate(length(max = 100))]
    pub salary_range: Option<String>,
    pub employment_type: EmploymentType,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub closing_date: Option<NaiveDate>,
}

impl From<JobPostingBody> for JobPostingInput {
    fn from(body: JobPostingBody) -> Self {
        Self {
            title: body.title.trim().to_string(),
            department_id: body.department_id,
            description: body.description,
            requirements: body.requirements,
            salary_range: body.salary_range,
            employment_type: body.employment_type,
            location: body.location,
            status: body.status,
            closing_date: body.closing_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBody {
    #[validate(length(min = 2, max = 100, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
    #[serde(deserialize_with = "serde_helpers::email")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(url(message = "Invalid LinkedIn URL"))]
    pub linkedin_profile: Option<String>,
}

impl From<CandidateBody> for CandidateInput {
    fn from(body: CandidateBody) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            phone: body.phone,
            linkedin_profile: body.linkedin_profile,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationBody {
    #[validate(length(min = 1, message = "Candidate is required"))]
    pub candidate_id: String,
    #[validate(length(min = 1, message = "Job posting is required"))]
    pub job_posting_id: String,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplicationUpdateBody {
    pub status: Option<ApplicationStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<JobStatus>,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ApplicationStatus>,
    pub job_posting_id: Option<String>,
    pub candidate_id: Option<String>,
}

// ========== Job postings ==========

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<JobPosting>>>> {
    let filter = JobPostingFilter {
        status: query.status,
        department_id: query.department_id.filter(|s| !s.is_empty()),
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let jobs = recruitment::list_jobs(state.store(), &filter, page).await?;
    Ok(Json(ApiResponse::success(jobs)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<JobPosting>>> {
    let job = recruitment::find_job(state.store(), &id).await?;
    Ok(Json(ApiResponse::success(job)))
}

/// The caller is recorded as the poster
pub async fn create_job(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<JobPostingBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<JobPosting>>)> {
    validate_body(&body)?;
    let job = recruitment::create_job(
        state.store(),
        &user.id,
        body.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Job posting created successfully",
            job,
        )),
    ))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<JobPostingBody>,
) -> AppResult<Json<ApiResponse<JobPosting>>> {
    validate_body(&body)?;
    let job =
        recruitment::update_job(state.store(), &id, body.into(), state.now().timestamp_millis())
            .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Job posting updated successfully",
        job,
    )))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    recruitment::delete_job(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Job posting deleted successfully")))
}

// ========== Candidates ==========

pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidateListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Candidate>>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let candidates =
        recruitment::list_candidates(state.store(), query.search.as_deref(), page).await?;
    Ok(Json(ApiResponse::success(candidates)))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Candidate>>> {
    let candidate = recruitment::find_candidate(state.store(), &id).await?;
    Ok(Json(ApiResponse::success(candidate)))
}

pub async fn create_candidate(
    State(state): State<AppState>,
    Json(body): Json<CandidateBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<Candidate>>)> {
    validate_body(&body)?;
    let candidate =
        recruitment::create_candidate(state.store(), body.into(), state.now().timestamp_millis())
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Candidate created successfully",
            candidate,
        )),
    ))
}

pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CandidateBody>,
) -> AppResult<Json<ApiResponse<Candidate>>> {
    validate_body(&body)?;
    let candidate = recruitment::update_candidate(
        state.store(),
        &id,
        body.into(),
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Candidate updated successfully",
        candidate,
    )))
}

pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    recruitment::delete_candidate(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Candidate deleted successfully")))
}

// ========== Applications ==========

pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Application>>>> {
    let filter = ApplicationFilter {
        status: query.status,
        job_posting_id: query.job_posting_id,
        candidate_id: query.candidate_id,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let applications = recruitment::list_applications(state.store(), &filter, page).await?;
    Ok(Json(ApiResponse::success(applications)))
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Application>>> {
    let application = recruitment::find_application(state.store(), &id).await?;
    Ok(Json(ApiResponse::success(application)))
}

pub async fn create_application(
    State(state): State<AppState>,
    Json(body): Json<ApplicationBody>,
) -> AppResult<(StatusCode, Json<ApiResponse<Application>>)> {
    validate_body(&body)?;
    let application = recruitment::apply(
        state.store(),
        &body.candidate_id,
        &body.job_posting_id,
        body.notes,
        state.now().timestamp_millis(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Application submitted successfully",
            application,
        )),
    ))
}

pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ApplicationUpdateBody>,
) -> AppResult<Json<ApiResponse<Application>>> {
    validate_body(&body)?;
    let application = recruitment::update_application(
        state.store(),
        &id,
        body.status,
        body.notes,
        state.now().timestamp_millis(),
    )
    .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Application updated successfully",
        application,
    )))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    recruitment::delete_application(state.store(), &id).await?;
    Ok(Json(ApiResponse::message("Application deleted successfully")))
}

// ========== Analytics ==========

pub async fn pipeline(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<PipelineStage>>>> {
    let stages = recruitment::pipeline(state.store()).await?;
    Ok(Json(ApiResponse::success(stages)))
}

pub async fn metrics(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RecruitmentMetrics>>> {
    let metrics = recruitment::metrics(state.store()).await?;
    Ok(Json(ApiResponse::success(metrics)))
}
