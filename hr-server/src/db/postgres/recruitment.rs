use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    Application, ApplicationStatus, Candidate, EmploymentType, JobPosting, JobStatus,
};
use shared::{PageQuery, PaginatedResponse};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, corrupt};
use crate::db::{ApplicationFilter, JobPostingFilter, RecruitmentStore, RepoError, RepoResult};

const SELECT_CANDIDATE: &str = "SELECT id, first_name, last_name, email, phone, \
     linkedin_profile, created_at, updated_at FROM candidates";

#[derive(sqlx::FromRow)]
struct JobPostingRow {
    id: String,
    title: String,
    department_id: String,
    description: String,
    requirements: Option<String>,
    salary_range: Option<String>,
    employment_type: String,
    location: Option<String>,
    status: String,
    posted_by: String,
    posted_at: Option<i64>,
    closing_date: Option<NaiveDate>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<JobPostingRow> for JobPosting {
    type Error = RepoError;

    fn try_from(row: JobPostingRow) -> Result<Self, Self::Error> {
        let status =
            JobStatus::from_db(&row.status).ok_or_else(|| corrupt("job status", &row.status))?;
        let employment_type = EmploymentType::from_db(&row.employment_type)
            .ok_or_else(|| corrupt("employment type", &row.employment_type))?;
        Ok(JobPosting {
            id: row.id,
            title: row.title,
            department_id: row.department_id,
            description: row.description,
            requirements: row.requirements,
            salary_range: row.salary_range,
            employment_type,
            location: row.location,
            status,
            posted_by: row.posted_by,
            posted_at: row.posted_at,
            closing_date: row.closing_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: String,
    candidate_id: String,
    job_posting_id: String,
    status: String,
    application_date: i64,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = RepoError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::from_db(&row.status)
            .ok_or_else(|| corrupt("application status", &row.status))?;
        Ok(Application {
            id: row.id,
            candidate_id: row.candidate_id,
            job_posting_id: row.job_posting_id,
            status,
            application_date: row.application_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_job_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a JobPostingFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(dept) = &filter.department_id {
        qb.push(" AND department_id = ").push_bind(dept);
    }
}

fn push_candidate_search<'a>(qb: &mut QueryBuilder<'a, Postgres>, search: Option<&'a str>) {
    if let Some(term) = search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(" WHERE (LOWER(first_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(last_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR email LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_application_filter<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    filter: &'a ApplicationFilter,
) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(job_id) = &filter.job_posting_id {
        qb.push(" AND job_posting_id = ").push_bind(job_id);
    }
    if let Some(candidate_id) = &filter.candidate_id {
        qb.push(" AND candidate_id = ").push_bind(candidate_id);
    }
}

#[async_trait]
impl RecruitmentStore for PgStore {
    async fn create_job_posting(&self, job: &JobPosting) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO job_postings (id, title, department_id, description, requirements, \
             salary_range, employment_type, location, status, posted_by, posted_at, \
             closing_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(&job.id)
        .bind(&job.title)
        .bind(&job.department_id)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.salary_range)
        .bind(job.employment_type.as_db())
        .bind(&job.location)
        .bind(job.status.as_db())
        .bind(&job.posted_by)
        .bind(job.posted_at)
        .bind(job.closing_date)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_job_posting(&self, id: &str) -> RepoResult<Option<JobPosting>> {
        let row: Option<JobPostingRow> =
            sqlx::query_as("SELECT * FROM job_postings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(JobPosting::try_from).transpose()
    }

    async fn update_job_posting(&self, job: &JobPosting) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE job_postings SET title = $1, department_id = $2, description = $3, \
             requirements = $4, salary_range = $5, employment_type = $6, location = $7, \
             status = $8, posted_at = $9, closing_date = $10, updated_at = $11 WHERE id = $12",
        )
        .bind(&job.title)
        .bind(&job.department_id)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.salary_range)
        .bind(job.employment_type.as_db())
        .bind(&job.location)
        .bind(job.status.as_db())
        .bind(job.posted_at)
        .bind(job.closing_date)
        .bind(job.updated_at)
        .bind(&job.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("job posting {}", job.id)));
        }
        Ok(())
    }

    async fn delete_job_posting(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_job_postings(
        &self,
        filter: &JobPostingFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<JobPosting>> {
        let total = self.count_job_postings(filter).await?;

        let mut qb = QueryBuilder::new("SELECT * FROM job_postings");
        push_job_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<JobPostingRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let data = rows
            .into_iter()
            .map(JobPosting::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, total, page.page(), page.limit()))
    }

    async fn count_job_postings(&self, filter: &JobPostingFilter) -> RepoResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM job_postings");
        push_job_filter(&mut qb, filter);
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn create_candidate(&self, candidate: &Candidate) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO candidates (id, first_name, last_name, email, phone, linkedin_profile, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&candidate.id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.linkedin_profile)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_candidate(&self, id: &str) -> RepoResult<Option<Candidate>> {
        Ok(sqlx::query_as(&format!("{SELECT_CANDIDATE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_candidate(&self, candidate: &Candidate) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE candidates SET first_name = $1, last_name = $2, email = $3, phone = $4, \
             linkedin_profile = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.linkedin_profile)
        .bind(candidate.updated_at)
        .bind(&candidate.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("candidate {}", candidate.id)));
        }
        Ok(())
    }

    async fn delete_candidate(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_candidates(
        &self,
        search: Option<&str>,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Candidate>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM candidates");
        push_candidate_search(&mut count, search);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT_CANDIDATE);
        push_candidate_search(&mut qb, search);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let data: Vec<Candidate> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(PaginatedResponse::new(data, total as u64, page.page(), page.limit()))
    }

    async fn count_candidates(&self) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn create_application(&self, application: &Application) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO applications (id, candidate_id, job_posting_id, status, \
             application_date, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&application.id)
        .bind(&application.candidate_id)
        .bind(&application.job_posting_id)
        .bind(application.status.as_db())
        .bind(application.application_date)
        .bind(&application.notes)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_application(&self, id: &str) -> RepoResult<Option<Application>> {
        let row: Option<ApplicationRow> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Application::try_from).transpose()
    }

    async fn update_application(&self, application: &Application) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE applications SET status = $1, notes = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(application.status.as_db())
        .bind(&application.notes)
        .bind(application.updated_at)
        .bind(&application.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("application {}", application.id)));
        }
        Ok(())
    }

    async fn delete_application(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Application>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM applications");
        push_application_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new("SELECT * FROM applications");
        push_application_filter(&mut qb, filter);
        qb.push(" ORDER BY application_date DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<ApplicationRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let data = rows
            .into_iter()
            .map(Application::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, total as u64, page.page(), page.limit()))
    }

    async fn count_applications_by_status(&self) -> RepoResult<Vec<(ApplicationStatus, u64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(status, count)| {
                ApplicationStatus::from_db(&status)
                    .map(|s| (s, count as u64))
                    .ok_or_else(|| corrupt("application status", &status))
            })
            .collect()
    }
}
