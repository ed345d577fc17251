//! Departments, performance and recruitment tables

use std::collections::BTreeMap;

use async_trait::async_trait;
use shared::models::{
    Application, ApplicationStatus, Candidate, Department, Goal, JobPosting, PerformanceReview,
};
use shared::{PageQuery, PaginatedResponse};

use super::{MemoryStore, Tables};
use crate::db::{
    ApplicationFilter, DepartmentStore, GoalFilter, JobPostingFilter, PerformanceStore,
    RecruitmentStore, RepoError, RepoResult, ReviewFilter,
};

impl Tables {
    fn department_name_taken(&self, department: &Department) -> bool {
        self.departments
            .values()
            .any(|d| d.id != department.id && d.name == department.name)
    }

    fn candidate_email_taken(&self, candidate: &Candidate) -> bool {
        self.candidates
            .values()
            .any(|c| c.id != candidate.id && c.email == candidate.email)
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut rows: Vec<Department> = self.tables.lock().departments.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_department(&self, id: &str) -> RepoResult<Option<Department>> {
        Ok(self.tables.lock().departments.get(id).cloned())
    }

    async fn create_department(&self, department: &Department) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.department_name_taken(department) {
            return Err(RepoError::Duplicate(format!(
                "department {} already exists",
                department.name
            )));
        }
        t.departments
            .insert(department.id.clone(), department.clone());
        Ok(())
    }

    async fn update_department(&self, department: &Department) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.department_name_taken(department) {
            return Err(RepoError::Duplicate(format!(
                "department {} already exists",
                department.name
            )));
        }
        match t.departments.get_mut(&department.id) {
            Some(stored) => {
                *stored = department.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("department {}", department.id))),
        }
    }

    async fn ensure_department(&self, department: &Department) -> RepoResult<Department> {
        let mut t = self.tables.lock();
        if let Some(existing) = t.departments.values().find(|d| d.name == department.name) {
            return Ok(existing.clone());
        }
        t.departments
            .insert(department.id.clone(), department.clone());
        Ok(department.clone())
    }
}

#[async_trait]
impl PerformanceStore for MemoryStore {
    async fn create_review(&self, review: &PerformanceReview) -> RepoResult<()> {
        let mut t = self.tables.lock();
        t.reviews.insert(review.id.clone(), review.clone());
        Ok(())
    }

    async fn find_review(&self, id: &str) -> RepoResult<Option<PerformanceReview>> {
        Ok(self.tables.lock().reviews.get(id).cloned())
    }

    async fn update_review(&self, review: &PerformanceReview) -> RepoResult<()> {
        let mut t = self.tables.lock();
        match t.reviews.get_mut(&review.id) {
            Some(stored) => {
                *stored = review.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("review {}", review.id))),
        }
    }

    async fn delete_review(&self, id: &str) -> RepoResult<bool> {
        Ok(self.tables.lock().reviews.remove(id).is_some())
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<PerformanceReview>> {
        let rows = self.find_reviews(filter).await?;
        Ok(page.apply(rows))
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> RepoResult<Vec<PerformanceReview>> {
        let mut rows: Vec<PerformanceReview> = {
            let t = self.tables.lock();
            t.reviews
                .values()
                .filter(|r| {
                    filter.matches(r) && t.in_department(&r.employee_id, &filter.department_id)
                })
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn create_goal(&self, goal: &Goal) -> RepoResult<()> {
        let mut t = self.tables.lock();
        t.goals.insert(goal.id.clone(), goal.clone());
        Ok(())
    }

    async fn find_goal(&self, id: &str) -> RepoResult<Option<Goal>> {
        Ok(self.tables.lock().goals.get(id).cloned())
    }

    async fn update_goal(&self, goal: &Goal) -> RepoResult<()> {
        let mut t = self.tables.lock();
        match t.goals.get_mut(&goal.id) {
            Some(stored) => {
                *stored = goal.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("goal {}", goal.id))),
        }
    }

    async fn delete_goal(&self, id: &str) -> RepoResult<bool> {
        Ok(self.tables.lock().goals.remove(id).is_some())
    }

    async fn list_goals(&self, filter: &GoalFilter) -> RepoResult<Vec<Goal>> {
        let mut rows: Vec<Goal> = {
            let t = self.tables.lock();
            t.goals.values().filter(|g| filter.matches(g)).cloned().collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl RecruitmentStore for MemoryStore {
    async fn create_job_posting(&self, job: &JobPosting) -> RepoResult<()> {
        let mut t = self.tables.lock();
        t.job_postings.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_job_posting(&self, id: &str) -> RepoResult<Option<JobPosting>> {
        Ok(self.tables.lock().job_postings.get(id).cloned())
    }

    async fn update_job_posting(&self, job: &JobPosting) -> RepoResult<()> {
        let mut t = self.tables.lock();
        match t.job_postings.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("job posting {}", job.id))),
        }
    }

    async fn delete_job_posting(&self, id: &str) -> RepoResult<bool> {
        let mut t = self.tables.lock();
        if t.job_postings.remove(id).is_none() {
            return Ok(false);
        }
        t.applications.retain(|_, a| a.job_posting_id != id);
        Ok(true)
    }

    async fn list_job_postings(
        &self,
        filter: &JobPostingFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<JobPosting>> {
        let mut rows: Vec<JobPosting> = {
            let t = self.tables.lock();
            t.job_postings
                .values()
                .filter(|j| filter.matches(j))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.apply(rows))
    }

    async fn count_job_postings(&self, filter: &JobPostingFilter) -> RepoResult<u64> {
        let t = self.tables.lock();
        Ok(t.job_postings.values().filter(|j| filter.matches(j)).count() as u64)
    }

    async fn create_candidate(&self, candidate: &Candidate) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.candidate_email_taken(candidate) {
            return Err(RepoError::Duplicate("candidate email already registered".into()));
        }
        t.candidates.insert(candidate.id.clone(), candidate.clone());
        Ok(())
    }

    async fn find_candidate(&self, id: &str) -> RepoResult<Option<Candidate>> {
        Ok(self.tables.lock().candidates.get(id).cloned())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.candidate_email_taken(candidate) {
            return Err(RepoError::Duplicate("candidate email already registered".into()));
        }
        match t.candidates.get_mut(&candidate.id) {
            Some(stored) => {
                *stored = candidate.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("candidate {}", candidate.id))),
        }
    }

    async fn delete_candidate(&self, id: &str) -> RepoResult<bool> {
        let mut t = self.tables.lock();
        if t.candidates.remove(id).is_none() {
            return Ok(false);
        }
        t.applications.retain(|_, a| a.candidate_id != id);
        Ok(true)
    }

    async fn list_candidates(
        &self,
        search: Option<&str>,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Candidate>> {
        let term = search.map(str::to_lowercase);
        let mut rows: Vec<Candidate> = {
            let t = self.tables.lock();
            t.candidates
                .values()
                .filter(|c| {
                    term.as_deref().is_none_or(|term| {
                        c.first_name.to_lowercase().contains(term)
                            || c.last_name.to_lowercase().contains(term)
                            || c.email.contains(term)
                    })
                })
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.apply(rows))
    }

    async fn count_candidates(&self) -> RepoResult<u64> {
        Ok(self.tables.lock().candidates.len() as u64)
    }

    async fn create_application(&self, application: &Application) -> RepoResult<()> {
        let mut t = self.tables.lock();
        let repeat = t.applications.values().any(|a| {
            a.candidate_id == application.candidate_id
                && a.job_posting_id == application.job_posting_id
        });
        if repeat {
            return Err(RepoError::Duplicate("application already exists".into()));
        }
        t.applications
            .insert(application.id.clone(), application.clone());
        Ok(())
    }

    async fn find_application(&self, id: &str) -> RepoResult<Option<Application>> {
        Ok(self.tables.lock().applications.get(id).cloned())
    }

    async fn update_application(&self, application: &Application) -> RepoResult<()> {
        let mut t = self.tables.lock();
        match t.applications.get_mut(&application.id) {
            Some(stored) => {
                stored.status = application.status;
                stored.notes = application.notes.clone();
                stored.updated_at = application.updated_at;
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("application {}", application.id))),
        }
    }

    async fn delete_application(&self, id: &str) -> RepoResult<bool> {
        Ok(self.tables.lock().applications.remove(id).is_some())
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Application>> {
        let mut rows: Vec<Application> = {
            let t = self.tables.lock();
            t.applications
                .values()
                .filter(|a| filter.matches(a))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| {
            b.application_date
                .cmp(&a.application_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(page.apply(rows))
    }

    async fn count_applications_by_status(&self) -> RepoResult<Vec<(ApplicationStatus, u64)>> {
        let t = self.tables.lock();
        let mut counts: BTreeMap<ApplicationStatus, u64> = BTreeMap::new();
        for application in t.applications.values() {
            *counts.entry(application.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
