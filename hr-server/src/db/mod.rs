//! Entity store
//!
//! The store is a capability created once at start-up and injected through
//! [`crate::AppState`]. Two implementations exist: PostgreSQL via sqlx for
//! deployments and an in-memory store for development and tests. Both honour
//! the same atomic units:
//!
//! - clock-in is create-if-absent on (user, date)
//! - attendance mutations are compare-and-swap
//! - leave transitions (and the balance debit on approval) run as one unit
//!
//! Filters that carry a `department_id` are resolved through the owning
//! user's department at query time.

pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    Application, ApplicationStatus, Attendance, AttendanceStatus, Candidate, Department, Goal,
    GoalStatus, JobPosting, JobStatus, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
    PerformanceReview, Profile, ReviewStatus, Role, TimeEntry, User, UserStatus,
};
use shared::{AppError, ErrorCode, PageQuery, PaginatedResponse};
use thiserror::Error;

use crate::attendance::AttendanceError;
use crate::leave::{LeaveError, LeaveTransition};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error(transparent)]
    Leave(#[from] LeaveError),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Attendance(e) => e.into(),
            RepoError::Leave(e) => e.into(),
        }
    }
}

/// User with its profile and credential hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub profile: Profile,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive match on employee id, email, first or last name
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub department_id: Option<String>,
    pub role_id: Option<String>,
    /// Hire date on or after
    pub hired_since: Option<NaiveDate>,
}

impl UserFilter {
    pub fn matches(&self, record: &UserRecord) -> bool {
        let user = &record.user;
        if self.status.is_some_and(|s| s != user.status) {
            return false;
        }
        if let Some(dept) = &self.department_id
            && user.department_id.as_deref() != Some(dept.as_str())
        {
            return false;
        }
        if let Some(role_id) = &self.role_id
            && &user.role_id != role_id
        {
            return false;
        }
        if let Some(since) = self.hired_since
            && record.profile.hire_date.is_none_or(|d| d < since)
        {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [
                user.employee_id.as_str(),
                user.email.as_str(),
                record.profile.first_name.as_str(),
                record.profile.last_name.as_str(),
            ]
            .iter()
            .any(|f| f.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub department_id: Option<String>,
}

impl AttendanceFilter {
    /// Row fields only; `department_id` needs the owning user
    pub fn matches(&self, record: &Attendance) -> bool {
        self.user_id.as_ref().is_none_or(|u| &record.user_id == u)
            && self.start_date.is_none_or(|d| record.date >= d)
            && self.end_date.is_none_or(|d| record.date <= d)
            && self.status.is_none_or(|s| record.status == s)
    }
}

#[derive(Debug, Clone)]
pub struct TimeEntryFilter {
    pub user_id: String,
    /// Start time on or after (millis)
    pub from: Option<i64>,
    /// Start time before (millis)
    pub until: Option<i64>,
}

impl TimeEntryFilter {
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        entry.user_id == self.user_id
            && self.from.is_none_or(|t| entry.start_time >= t)
            && self.until.is_none_or(|t| entry.start_time < t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeaveRequestFilter {
    pub user_id: Option<String>,
    pub status: Option<LeaveStatus>,
    pub leave_type_id: Option<String>,
    /// Start date on or after
    pub start_date: Option<NaiveDate>,
    /// Start date on or before
    pub end_date: Option<NaiveDate>,
    /// Covers this day (start <= day <= end)
    pub covering: Option<NaiveDate>,
    pub department_id: Option<String>,
}

impl LeaveRequestFilter {
    /// Row fields only; `department_id` needs the owning user
    pub fn matches(&self, r: &LeaveRequest) -> bool {
        self.user_id.as_ref().is_none_or(|u| &r.user_id == u)
            && self.status.is_none_or(|s| r.status == s)
            && self
                .leave_type_id
                .as_ref()
                .is_none_or(|t| &r.leave_type_id == t)
            && self.start_date.is_none_or(|d| r.start_date >= d)
            && self.end_date.is_none_or(|d| r.start_date <= d)
            && self
                .covering
                .is_none_or(|d| r.start_date <= d && d <= r.end_date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub employee_id: Option<String>,
    pub status: Option<ReviewStatus>,
    /// Period starting on or after
    pub period_start_since: Option<NaiveDate>,
    /// Period starting on or before
    pub period_start_until: Option<NaiveDate>,
    pub department_id: Option<String>,
}

impl ReviewFilter {
    /// Row fields only; `department_id` needs the reviewed employee
    pub fn matches(&self, r: &PerformanceReview) -> bool {
        self.employee_id.as_ref().is_none_or(|e| &r.employee_id == e)
            && self.status.is_none_or(|s| r.status == s)
            && self
                .period_start_since
                .is_none_or(|d| r.review_period_start >= d)
            && self
                .period_start_until
                .is_none_or(|d| r.review_period_start <= d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    pub user_id: Option<String>,
    pub status: Option<GoalStatus>,
}

impl GoalFilter {
    pub fn matches(&self, g: &Goal) -> bool {
        self.user_id.as_ref().is_none_or(|u| &g.user_id == u)
            && self.status.is_none_or(|s| g.status == s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobPostingFilter {
    pub status: Option<JobStatus>,
    pub department_id: Option<String>,
}

impl JobPostingFilter {
    pub fn matches(&self, j: &JobPosting) -> bool {
        self.status.is_none_or(|s| j.status == s)
            && self
                .department_id
                .as_ref()
                .is_none_or(|d| &j.department_id == d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub job_posting_id: Option<String>,
    pub candidate_id: Option<String>,
}

impl ApplicationFilter {
    pub fn matches(&self, a: &Application) -> bool {
        self.status.is_none_or(|s| a.status == s)
            && self
                .job_posting_id
                .as_ref()
                .is_none_or(|j| &a.job_posting_id == j)
            && self
                .candidate_id
                .as_ref()
                .is_none_or(|c| &a.candidate_id == c)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> RepoResult<Option<UserRecord>>;
    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
    /// Whether any account already holds this email or employee id
    async fn identity_exists(&self, email: &str, employee_id: &str) -> RepoResult<bool>;
    /// Insert user and profile; a taken email or employee id is `Duplicate`
    async fn create_user(&self, record: &UserRecord) -> RepoResult<()>;
    /// Overwrite user and profile fields, keeping the credential hash
    async fn update_user(&self, user: &User, profile: &Profile) -> RepoResult<()>;
    /// Newest first
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<UserRecord>>;
    async fn count_users(&self, filter: &UserFilter) -> RepoResult<u64>;

    async fn find_role(&self, id: &str) -> RepoResult<Option<Role>>;
    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>>;
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;
    /// Insert the role unless its name is taken; returns the stored role
    async fn ensure_role(&self, role: &Role) -> RepoResult<Role>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_attendance(&self, user_id: &str, date: NaiveDate)
    -> RepoResult<Option<Attendance>>;
    /// Atomic create-if-absent clock-in for (user, date)
    ///
    /// Fails with [`AttendanceError::AlreadyClockedIn`] when the day already
    /// has a clock-in, however many callers race.
    async fn clock_in(
        &self,
        id: String,
        user_id: &str,
        date: NaiveDate,
        now_ms: i64,
        notes: Option<String>,
    ) -> RepoResult<Attendance>;
    /// Store `next` iff the row still matches `current`; false when it moved
    async fn replace_attendance(&self, current: &Attendance, next: &Attendance)
    -> RepoResult<bool>;
    /// Newest date first
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Attendance>>;
    async fn find_attendance_range(&self, filter: &AttendanceFilter)
    -> RepoResult<Vec<Attendance>>;
}

#[async_trait]
pub trait TimeEntryStore: Send + Sync {
    async fn create_time_entry(&self, entry: &TimeEntry) -> RepoResult<()>;
    async fn find_time_entry(&self, id: &str) -> RepoResult<Option<TimeEntry>>;
    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()>;
    async fn delete_time_entry(&self, id: &str) -> RepoResult<bool>;
    /// Newest start first
    async fn list_time_entries(&self, filter: &TimeEntryFilter) -> RepoResult<Vec<TimeEntry>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>>;
    async fn find_leave_type(&self, id: &str) -> RepoResult<Option<LeaveType>>;
    /// A taken name is `Duplicate`
    async fn create_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()>;
    async fn update_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()>;

    async fn create_leave_request(&self, request: &LeaveRequest) -> RepoResult<()>;
    async fn find_leave_request(&self, id: &str) -> RepoResult<Option<LeaveRequest>>;
    /// Overwrite the editable fields iff the stored request is still pending
    async fn update_pending_leave_request(
        &self,
        request: &LeaveRequest,
    ) -> RepoResult<LeaveRequest>;
    /// Lifecycle transition as one atomic unit
    ///
    /// An enforced approval debits the (user, type, start year) balance in the
    /// same unit, opening the balance first when the year has none.
    async fn transition_leave_request(
        &self,
        id: &str,
        transition: &LeaveTransition,
        now_ms: i64,
    ) -> RepoResult<LeaveRequest>;
    async fn delete_leave_request(&self, id: &str) -> RepoResult<bool>;
    /// Newest first
    async fn list_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<LeaveRequest>>;
    async fn find_leave_requests(&self, filter: &LeaveRequestFilter)
    -> RepoResult<Vec<LeaveRequest>>;

    async fn list_leave_balances(
        &self,
        user_id: Option<&str>,
        year: i32,
    ) -> RepoResult<Vec<LeaveBalance>>;
    /// Upsert the allocation of (user, type, year), keeping used days
    async fn set_leave_allocation(
        &self,
        user_id: &str,
        leave_type_id: &str,
        year: i32,
        allocated_days: i32,
        now_ms: i64,
    ) -> RepoResult<LeaveBalance>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    /// By name
    async fn list_departments(&self) -> RepoResult<Vec<Department>>;
    async fn find_department(&self, id: &str) -> RepoResult<Option<Department>>;
    /// A taken name is `Duplicate`
    async fn create_department(&self, department: &Department) -> RepoResult<()>;
    async fn update_department(&self, department: &Department) -> RepoResult<()>;
    /// Insert the department unless its name is taken; returns the stored one
    async fn ensure_department(&self, department: &Department) -> RepoResult<Department>;
}

#[async_trait]
pub trait PerformanceStore: Send + Sync {
    async fn create_review(&self, review: &PerformanceReview) -> RepoResult<()>;
    async fn find_review(&self, id: &str) -> RepoResult<Option<PerformanceReview>>;
    async fn update_review(&self, review: &PerformanceReview) -> RepoResult<()>;
    async fn delete_review(&self, id: &str) -> RepoResult<bool>;
    /// Newest first
    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<PerformanceReview>>;
    async fn find_reviews(&self, filter: &ReviewFilter) -> RepoResult<Vec<PerformanceReview>>;

    async fn create_goal(&self, goal: &Goal) -> RepoResult<()>;
    async fn find_goal(&self, id: &str) -> RepoResult<Option<Goal>>;
    async fn update_goal(&self, goal: &Goal) -> RepoResult<()>;
    async fn delete_goal(&self, id: &str) -> RepoResult<bool>;
    /// Newest first
    async fn list_goals(&self, filter: &GoalFilter) -> RepoResult<Vec<Goal>>;
}

#[async_trait]
pub trait RecruitmentStore: Send + Sync {
    async fn create_job_posting(&self, job: &JobPosting) -> RepoResult<()>;
    async fn find_job_posting(&self, id: &str) -> RepoResult<Option<JobPosting>>;
    async fn update_job_posting(&self, job: &JobPosting) -> RepoResult<()>;
    /// Removes the posting's applications with it
    async fn delete_job_posting(&self, id: &str) -> RepoResult<bool>;
    /// Newest first
    async fn list_job_postings(
        &self,
        filter: &JobPostingFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<JobPosting>>;
    async fn count_job_postings(&self, filter: &JobPostingFilter) -> RepoResult<u64>;

    /// A taken email is `Duplicate`
    async fn create_candidate(&self, candidate: &Candidate) -> RepoResult<()>;
    async fn find_candidate(&self, id: &str) -> RepoResult<Option<Candidate>>;
    async fn update_candidate(&self, candidate: &Candidate) -> RepoResult<()>;
    /// Removes the candidate's applications with it
    async fn delete_candidate(&self, id: &str) -> RepoResult<bool>;
    /// Newest first; `search` matches first name, last name or email
    async fn list_candidates(
        &self,
        search: Option<&str>,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Candidate>>;
    async fn count_candidates(&self) -> RepoResult<u64>;

    /// One application per (candidate, posting); a repeat is `Duplicate`
    async fn create_application(&self, application: &Application) -> RepoResult<()>;
    async fn find_application(&self, id: &str) -> RepoResult<Option<Application>>;
    async fn update_application(&self, application: &Application) -> RepoResult<()>;
    async fn delete_application(&self, id: &str) -> RepoResult<bool>;
    /// Newest application date first
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Application>>;
    /// Application count per status, statuses without applications omitted
    async fn count_applications_by_status(&self) -> RepoResult<Vec<(ApplicationStatus, u64)>>;
}

/// Every store capability in one handle
pub trait Store:
    UserStore
    + AttendanceStore
    + TimeEntryStore
    + LeaveStore
    + DepartmentStore
    + PerformanceStore
    + RecruitmentStore
{
}

impl<T> Store for T where
    T: UserStore
        + AttendanceStore
        + TimeEntryStore
        + LeaveStore
        + DepartmentStore
        + PerformanceStore
        + RecruitmentStore
{
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: u32, end: u32) -> LeaveRequest {
        LeaveRequest {
            id: "r".into(),
            user_id: "u1".into(),
            leave_type_id: "t".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, start).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, end).unwrap(),
            days_requested: (end - start + 1) as i32,
            reason: "Dentist appointment".into(),
            status: LeaveStatus::Approved,
            approved_by: None,
            approved_at: None,
            comments: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_leave_filter_covering() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let filter = LeaveRequestFilter {
            covering: Some(day),
            status: Some(LeaveStatus::Approved),
            ..Default::default()
        };
        assert!(filter.matches(&request(8, 12)));
        assert!(filter.matches(&request(10, 10)));
        assert!(!filter.matches(&request(11, 12)));
    }

    #[test]
    fn test_repo_error_mapping() {
        let err: AppError = RepoError::Attendance(AttendanceError::AlreadyClockedIn).into();
        assert_eq!(err.code, ErrorCode::AlreadyClockedIn);
        let err: AppError = RepoError::Database("boom".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        let err: AppError = RepoError::Duplicate("email".into()).into();
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }
}
