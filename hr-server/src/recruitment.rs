//! Recruitment: job postings, candidates and applications

use chrono::NaiveDate;
use shared::models::{
    Application, ApplicationStatus, Candidate, EmploymentType, JobPosting, JobStatus,
    PipelineStage, RecruitmentMetrics,
};
use shared::util::{new_id, normalize_email};
use shared::{AppError, AppResult, ErrorCode, PageQuery, PaginatedResponse};

use crate::db::{ApplicationFilter, JobPostingFilter, RepoError, Store};
use crate::departments;

/// Editable posting fields
#[derive(Debug, Clone)]
pub struct JobPostingInput {
    pub title: String,
    pub department_id: String,
    pub description: String,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub closing_date: Option<NaiveDate>,
}

/// Editable candidate fields
#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin_profile: Option<String>,
}

fn not_found(code: ErrorCode) -> impl Fn(RepoError) -> AppError {
    move |err| match err {
        RepoError::NotFound(_) => AppError::new(code),
        other => other.into(),
    }
}

fn email_taken(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::CandidateEmailExists),
        RepoError::NotFound(_) => AppError::new(ErrorCode::CandidateNotFound),
        other => other.into(),
    }
}

// ========== Job postings ==========

pub async fn find_job(store: &dyn Store, id: &str) -> AppResult<JobPosting> {
    store
        .find_job_posting(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::JobPostingNotFound))
}

pub async fn list_jobs(
    store: &dyn Store,
    filter: &JobPostingFilter,
    page: PageQuery,
) -> AppResult<PaginatedResponse<JobPosting>> {
    Ok(store.list_job_postings(filter, page).await?)
}

/// Stamp `posted_at` the first time a posting goes ACTIVE
fn mark_posted(job: &mut JobPosting, now_ms: i64) {
    if job.status == JobStatus::Active && job.posted_at.is_none() {
        job.posted_at = Some(now_ms);
    }
}

pub async fn create_job(
    store: &dyn Store,
    posted_by: &str,
    input: JobPostingInput,
    now_ms: i64,
) -> AppResult<JobPosting> {
    departments::find(store, &input.department_id).await?;
    let mut job = JobPosting {
        id: new_id(),
        title: input.title,
        department_id: input.department_id,
        description: input.description,
        requirements: input.requirements,
        salary_range: input.salary_range,
        employment_type: input.employment_type,
        location: input.location,
        status: input.status.unwrap_or_default(),
        posted_by: posted_by.to_string(),
        posted_at: None,
        closing_date: input.closing_date,
        created_at: now_ms,
        updated_at: now_ms,
    };
    mark_posted(&mut job, now_ms);
    store.create_job_posting(&job).await?;
    tracing::info!(job_id = %job.id, status = job.status.as_db(), "Job posting created");
    Ok(job)
}

pub async fn update_job(
    store: &dyn Store,
    id: &str,
    input: JobPostingInput,
    now_ms: i64,
) -> AppResult<JobPosting> {
    let mut job = find_job(store, id).await?;
    if job.department_id != input.department_id {
        departments::find(store, &input.department_id).await?;
    }
    job.title = input.title;
    job.department_id = input.department_id;
    job.description = input.description;
    job.requirements = input.requirements;
    job.salary_range = input.salary_range;
    job.employment_type = input.employment_type;
    job.location = input.location;
    job.closing_date = input.closing_date;
    if let Some(status) = input.status {
        job.status = status;
    }
    mark_posted(&mut job, now_ms);
    job.updated_at = now_ms;
    store
        .update_job_posting(&job)
        .await
        .map_err(not_found(ErrorCode::JobPostingNotFound))?;
    Ok(job)
}

/// Applications to the posting go with it
pub async fn delete_job(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_job_posting(id).await? {
        return Err(AppError::new(ErrorCode::JobPostingNotFound));
    }
    tracing::info!(job_id = %id, "Job posting deleted");
    Ok(())
}

// ========== Candidates ==========

pub async fn find_candidate(store: &dyn Store, id: &str) -> AppResult<Candidate> {
    store
        .find_candidate(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CandidateNotFound))
}

pub async fn list_candidates(
    store: &dyn Store,
    search: Option<&str>,
    page: PageQuery,
) -> AppResult<PaginatedResponse<Candidate>> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    Ok(store.list_candidates(search, page).await?)
}

pub async fn create_candidate(
    store: &dyn Store,
    input: CandidateInput,
    now_ms: i64,
) -> AppResult<Candidate> {
    let candidate = Candidate {
        id: new_id(),
        first_name: input.first_name,
        last_name: input.last_name,
        email: normalize_email(&input.email),
        phone: input.phone,
        linkedin_profile: input.linkedin_profile,
        created_at: now_ms,
        updated_at: now_ms,
    };
    store
        .create_candidate(&candidate)
        .await
        .map_err(email_taken)?;
    tracing::info!(candidate_id = %candidate.id, "Candidate created");
    Ok(candidate)
}

pub async fn update_candidate(
    store: &dyn Store,
    id: &str,
    input: CandidateInput,
    now_ms: i64,
) -> AppResult<Candidate> {
    let mut candidate = find_candidate(store, id).await?;
    candidate.first_name = input.first_name;
    candidate.last_name = input.last_name;
    candidate.email = normalize_email(&input.email);
    candidate.phone = input.phone;
    candidate.linkedin_profile = input.linkedin_profile;
    candidate.updated_at = now_ms;
    store
        .update_candidate(&candidate)
        .await
        .map_err(email_taken)?;
    Ok(candidate)
}

pub async fn delete_candidate(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_candidate(id).await? {
        return Err(AppError::new(ErrorCode::CandidateNotFound));
    }
    Ok(())
}

// ========== Applications ==========

pub async fn find_application(store: &dyn Store, id: &str) -> AppResult<Application> {
    store
        .find_application(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ApplicationNotFound))
}

pub async fn list_applications(
    store: &dyn Store,
    filter: &ApplicationFilter,
    page: PageQuery,
) -> AppResult<PaginatedResponse<Application>> {
    Ok(store.list_applications(filter, page).await?)
}

/// Only ACTIVE postings take applications, one per candidate
pub async fn apply(
    store: &dyn Store,
    candidate_id: &str,
    job_posting_id: &str,
    notes: Option<String>,
    now_ms: i64,
) -> AppResult<Application> {
    find_candidate(store, candidate_id).await?;
    let job = find_job(store, job_posting_id).await?;
    if job.status != JobStatus::Active {
        return Err(AppError::new(ErrorCode::JobPostingNotOpen));
    }

    let application = Application {
        id: new_id(),
        candidate_id: candidate_id.to_string(),
        job_posting_id: job_posting_id.to_string(),
        status: ApplicationStatus::Applied,
        application_date: now_ms,
        notes,
        created_at: now_ms,
        updated_at: now_ms,
    };
    match store.create_application(&application).await {
        Ok(()) => {}
        Err(RepoError::Duplicate(_)) => {
            return Err(AppError::new(ErrorCode::DuplicateApplication));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(
        application_id = %application.id,
        candidate_id = %candidate_id,
        job_posting_id = %job_posting_id,
        "Application received"
    );
    Ok(application)
}

/// Move an application along the pipeline; omitted fields keep their values
pub async fn update_application(
    store: &dyn Store,
    id: &str,
    status: Option<ApplicationStatus>,
    notes: Option<String>,
    now_ms: i64,
) -> AppResult<Application> {
    let mut application = find_application(store, id).await?;
    if let Some(status) = status {
        application.status = status;
    }
    if notes.is_some() {
        application.notes = notes;
    }
    application.updated_at = now_ms;
    store
        .update_application(&application)
        .await
        .map_err(not_found(ErrorCode::ApplicationNotFound))?;
    Ok(application)
}

pub async fn delete_application(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_application(id).await? {
        return Err(AppError::new(ErrorCode::ApplicationNotFound));
    }
    Ok(())
}

// ========== Analytics ==========

/// Every stage in pipeline order, empty stages included
pub async fn pipeline(store: &dyn Store) -> AppResult<Vec<PipelineStage>> {
    let counts = store.count_applications_by_status().await?;
    Ok(ApplicationStatus::ALL
        .iter()
        .map(|&status| PipelineStage {
            status,
            count: counts
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, n)| *n),
        })
        .collect())
}

pub async fn metrics(store: &dyn Store) -> AppResult<RecruitmentMetrics> {
    let total_jobs = store
        .count_job_postings(&JobPostingFilter::default())
        .await?;
    let active_jobs = store
        .count_job_postings(&JobPostingFilter {
            status: Some(JobStatus::Active),
            ..Default::default()
        })
        .await?;
    let total_applications = store
        .count_applications_by_status()
        .await?
        .iter()
        .map(|(_, n)| n)
        .sum();
    Ok(RecruitmentMetrics {
        total_jobs,
        active_jobs,
        total_applications,
        total_candidates: store.count_candidates().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::departments::DepartmentInput;

    async fn store_with_department() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let it = departments::create(
            &store,
            DepartmentInput {
                name: "Engineering".into(),
                description: None,
                budget: None,
            },
            0,
        )
        .await
        .unwrap();
        (store, it.id)
    }

    fn job(department_id: &str, status: Option<JobStatus>) -> JobPostingInput {
        JobPostingInput {
            title: "Platform Engineer".into(),
            department_id: department_id.into(),
            description: "Own the deployment pipeline and the services that run on it.".into(),
            requirements: None,
            salary_range: None,
            employment_type: EmploymentType::FullTime,
            location: None,
            status,
            closing_date: None,
        }
    }

    fn candidate(email: &str) -> CandidateInput {
        CandidateInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: None,
            linkedin_profile: None,
        }
    }

    #[tokio::test]
    async fn test_posted_at_set_on_first_activation() {
        let (store, dept) = store_with_department().await;
        let err = create_job(&store, "admin", job("nowhere", None), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DepartmentNotFound);

        let draft = create_job(&store, "admin", job(&dept, None), 1).await.unwrap();
        assert_eq!(draft.status, JobStatus::Draft);
        assert_eq!(draft.posted_at, None);

        let active = update_job(&store, &draft.id, job(&dept, Some(JobStatus::Active)), 5)
            .await
            .unwrap();
        assert_eq!(active.posted_at, Some(5));

        let closed = update_job(&store, &draft.id, job(&dept, Some(JobStatus::Closed)), 9)
            .await
            .unwrap();
        assert_eq!(closed.posted_at, Some(5));
        let reopened = update_job(&store, &draft.id, job(&dept, Some(JobStatus::Active)), 12)
            .await
            .unwrap();
        assert_eq!(reopened.posted_at, Some(5));
    }

    #[tokio::test]
    async fn test_candidate_email_is_normalized_and_unique() {
        let (store, _) = store_with_department().await;
        let ada = create_candidate(&store, candidate(" Ada@Example.com "), 1)
            .await
            .unwrap();
        assert_eq!(ada.email, "ada@example.com");

        let err = create_candidate(&store, candidate("ada@example.com"), 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CandidateEmailExists);

        let found = list_candidates(&store, Some("  love "), PageQuery::new(1, 10))
            .await
            .unwrap();
        assert_eq!(found.data, vec![ada]);
    }

    #[tokio::test]
    async fn test_applications_need_an_open_posting() {
        let (store, dept) = store_with_department().await;
        let ada = create_candidate(&store, candidate("ada@example.com"), 1)
            .await
            .unwrap();
        let draft = create_job(&store, "admin", job(&dept, None), 1).await.unwrap();
        let open = create_job(&store, "admin", job(&dept, Some(JobStatus::Active)), 1)
            .await
            .unwrap();

        let err = apply(&store, &ada.id, &draft.id, None, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::JobPostingNotOpen);
        let err = apply(&store, "ghost", &open.id, None, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CandidateNotFound);

        let application = apply(&store, &ada.id, &open.id, None, 2).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Applied);
        let err = apply(&store, &ada.id, &open.id, None, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateApplication);

        let moved = update_application(
            &store,
            &application.id,
            Some(ApplicationStatus::Interview),
            Some("Strong systems background".into()),
            4,
        )
        .await
        .unwrap();
        let kept = update_application(&store, &application.id, None, None, 5)
            .await
            .unwrap();
        assert_eq!(kept.status, ApplicationStatus::Interview);
        assert_eq!(kept.notes, moved.notes);

        let stages = pipeline(&store).await.unwrap();
        assert_eq!(stages.len(), ApplicationStatus::ALL.len());
        assert_eq!(stages[0].status, ApplicationStatus::Applied);
        assert_eq!(stages[0].count, 0);
        assert_eq!(stages[2].status, ApplicationStatus::Interview);
        assert_eq!(stages[2].count, 1);

        let figures = metrics(&store).await.unwrap();
        assert_eq!(
            figures,
            RecruitmentMetrics {
                total_jobs: 2,
                active_jobs: 1,
                total_applications: 1,
                total_candidates: 1,
            }
        );

        delete_job(&store, &open.id).await.unwrap();
        let err = find_application(&store, &application.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ApplicationNotFound);
    }
}
