//! In-memory store
//!
//! Every operation takes the single table lock once, so the atomic units of
//! the Postgres store hold here as well. Used for development without a
//! `DATABASE_URL` and by the test suites.

mod talent;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use shared::models::{
    Application, Attendance, Candidate, Department, Goal, JobPosting, LeaveBalance, LeaveRequest,
    LeaveType, PerformanceReview, Profile, Role, TimeEntry, User,
};
use shared::util::new_id;
use shared::{PageQuery, PaginatedResponse};

use super::{
    AttendanceFilter, AttendanceStore, LeaveRequestFilter, LeaveStore, RepoError, RepoResult,
    TimeEntryFilter, TimeEntryStore, UserFilter, UserRecord, UserStore,
};
use crate::attendance::machine;
use crate::leave::{LeaveError, LeaveTransition, ledger, lifecycle};

type BalanceKey = (String, String, i32);

#[derive(Default)]
struct Tables {
    roles: HashMap<String, Role>,
    users: HashMap<String, UserRecord>,
    attendance: HashMap<(String, NaiveDate), Attendance>,
    time_entries: HashMap<String, TimeEntry>,
    leave_types: HashMap<String, LeaveType>,
    leave_requests: HashMap<String, LeaveRequest>,
    leave_balances: HashMap<BalanceKey, LeaveBalance>,
    departments: HashMap<String, Department>,
    reviews: HashMap<String, PerformanceReview>,
    goals: HashMap<String, Goal>,
    job_postings: HashMap<String, JobPosting>,
    candidates: HashMap<String, Candidate>,
    applications: HashMap<String, Application>,
}

impl Tables {
    /// No department filter, or `user_id` belongs to it
    fn in_department(&self, user_id: &str, department_id: &Option<String>) -> bool {
        let Some(dept) = department_id else {
            return true;
        };
        self.users
            .get(user_id)
            .is_some_and(|r| r.user.department_id.as_ref() == Some(dept))
    }

    fn identity_taken(&self, user: &User) -> Option<&'static str> {
        self.users.values().find_map(|r| {
            if r.user.id == user.id {
                None
            } else if r.user.email == user.email {
                Some("email")
            } else if r.user.employee_id == user.employee_id {
                Some("employee id")
            } else {
                None
            }
        })
    }

    fn leave_type_name_taken(&self, leave_type: &LeaveType) -> bool {
        self.leave_types
            .values()
            .any(|t| t.id != leave_type.id && t.name == leave_type.name)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self.tables.lock().users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let t = self.tables.lock();
        Ok(t.users.values().find(|r| r.user.email == email).cloned())
    }

    async fn identity_exists(&self, email: &str, employee_id: &str) -> RepoResult<bool> {
        let t = self.tables.lock();
        Ok(t.users
            .values()
            .any(|r| r.user.email == email || r.user.employee_id == employee_id))
    }

    async fn create_user(&self, record: &UserRecord) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if let Some(field) = t.identity_taken(&record.user) {
            return Err(RepoError::Duplicate(format!("{field} already registered")));
        }
        t.users.insert(record.user.id.clone(), record.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User, profile: &Profile) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if let Some(field) = t.identity_taken(user) {
            return Err(RepoError::Duplicate(format!("{field} already registered")));
        }
        let record = t
            .users
            .get_mut(&user.id)
            .ok_or_else(|| RepoError::NotFound(format!("user {}", user.id)))?;
        record.user = user.clone();
        record.profile = profile.clone();
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<UserRecord>> {
        let mut rows: Vec<UserRecord> = {
            let t = self.tables.lock();
            t.users.values().filter(|r| filter.matches(r)).cloned().collect()
        };
        rows.sort_by(|a, b| {
            b.user
                .created_at
                .cmp(&a.user.created_at)
                .then_with(|| a.user.employee_id.cmp(&b.user.employee_id))
        });
        Ok(page.apply(rows))
    }

    async fn count_users(&self, filter: &UserFilter) -> RepoResult<u64> {
        let t = self.tables.lock();
        Ok(t.users.values().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn find_role(&self, id: &str) -> RepoResult<Option<Role>> {
        Ok(self.tables.lock().roles.get(id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let t = self.tables.lock();
        Ok(t.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.tables.lock().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn ensure_role(&self, role: &Role) -> RepoResult<Role> {
        let mut t = self.tables.lock();
        if let Some(existing) = t.roles.values().find(|r| r.name == role.name) {
            return Ok(existing.clone());
        }
        t.roles.insert(role.id.clone(), role.clone());
        Ok(role.clone())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_attendance(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Option<Attendance>> {
        let t = self.tables.lock();
        Ok(t.attendance.get(&(user_id.to_string(), date)).cloned())
    }

    async fn clock_in(
        &self,
        id: String,
        user_id: &str,
        date: NaiveDate,
        now_ms: i64,
        notes: Option<String>,
    ) -> RepoResult<Attendance> {
        let mut t = self.tables.lock();
        let key = (user_id.to_string(), date);
        let record = match t.attendance.get(&key) {
            Some(existing) => machine::clock_in(existing, now_ms, notes)?,
            None => machine::open_day(id, user_id, date, now_ms, notes),
        };
        t.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn replace_attendance(
        &self,
        current: &Attendance,
        next: &Attendance,
    ) -> RepoResult<bool> {
        let mut t = self.tables.lock();
        let key = (current.user_id.clone(), current.date);
        match t.attendance.get_mut(&key) {
            Some(stored) if stored == current => {
                *stored = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Attendance>> {
        let rows = self.find_attendance_range(filter).await?;
        Ok(page.apply(rows))
    }

    async fn find_attendance_range(
        &self,
        filter: &AttendanceFilter,
    ) -> RepoResult<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = {
            let t = self.tables.lock();
            t.attendance
                .values()
                .filter(|r| filter.matches(r) && t.in_department(&r.user_id, &filter.department_id))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(rows)
    }
}

#[async_trait]
impl TimeEntryStore for MemoryStore {
    async fn create_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        let mut t = self.tables.lock();
        t.time_entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn find_time_entry(&self, id: &str) -> RepoResult<Option<TimeEntry>> {
        Ok(self.tables.lock().time_entries.get(id).cloned())
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        let mut t = self.tables.lock();
        match t.time_entries.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(format!("time entry {}", entry.id))),
        }
    }

    async fn delete_time_entry(&self, id: &str) -> RepoResult<bool> {
        Ok(self.tables.lock().time_entries.remove(id).is_some())
    }

    async fn list_time_entries(&self, filter: &TimeEntryFilter) -> RepoResult<Vec<TimeEntry>> {
        let mut rows: Vec<TimeEntry> = {
            let t = self.tables.lock();
            t.time_entries
                .values()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(rows)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>> {
        let mut rows: Vec<LeaveType> = {
            let t = self.tables.lock();
            t.leave_types
                .values()
                .filter(|lt| include_inactive || lt.is_active)
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_leave_type(&self, id: &str) -> RepoResult<Option<LeaveType>> {
        Ok(self.tables.lock().leave_types.get(id).cloned())
    }

    async fn create_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.leave_type_name_taken(leave_type) {
            return Err(RepoError::Duplicate(format!(
                "leave type {} already exists",
                leave_type.name
            )));
        }
        t.leave_types
            .insert(leave_type.id.clone(), leave_type.clone());
        Ok(())
    }

    async fn update_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()> {
        let mut t = self.tables.lock();
        if t.leave_type_name_taken(leave_type) {
            return Err(RepoError::Duplicate(format!(
                "leave type {} already exists",
                leave_type.name
            )));
        }
        match t.leave_types.get_mut(&leave_type.id) {
            Some(stored) => {
                *stored = leave_type.clone();
                Ok(())
            }
            None => Err(LeaveError::LeaveTypeNotFound.into()),
        }
    }

    async fn create_leave_request(&self, request: &LeaveRequest) -> RepoResult<()> {
        let mut t = self.tables.lock();
        t.leave_requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn find_leave_request(&self, id: &str) -> RepoResult<Option<LeaveRequest>> {
        Ok(self.tables.lock().leave_requests.get(id).cloned())
    }

    async fn update_pending_leave_request(
        &self,
        request: &LeaveRequest,
    ) -> RepoResult<LeaveRequest> {
        let mut t = self.tables.lock();
        let stored = t
            .leave_requests
            .get_mut(&request.id)
            .ok_or(LeaveError::RequestNotFound)?;
        lifecycle::ensure_pending(stored)?;
        stored.leave_type_id = request.leave_type_id.clone();
        stored.start_date = request.start_date;
        stored.end_date = request.end_date;
        stored.days_requested = request.days_requested;
        stored.reason = request.reason.clone();
        stored.updated_at = request.updated_at;
        Ok(stored.clone())
    }

    async fn transition_leave_request(
        &self,
        id: &str,
        transition: &LeaveTransition,
        now_ms: i64,
    ) -> RepoResult<LeaveRequest> {
        let mut guard = self.tables.lock();
        let t = &mut *guard;
        let current = t
            .leave_requests
            .get(id)
            .cloned()
            .ok_or(LeaveError::RequestNotFound)?;
        let next = lifecycle::apply(&current, transition, now_ms)?;

        if let LeaveTransition::Approve {
            enforce_balance: true,
            ..
        } = transition
        {
            let year = current.start_date.year();
            let key = (current.user_id.clone(), current.leave_type_id.clone(), year);
            let balance = match t.leave_balances.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let leave_type = t
                        .leave_types
                        .get(&current.leave_type_id)
                        .ok_or(LeaveError::LeaveTypeNotFound)?;
                    let previous = t.leave_balances.get(&(
                        current.user_id.clone(),
                        current.leave_type_id.clone(),
                        year - 1,
                    ));
                    ledger::opening_balance(
                        new_id(),
                        &current.user_id,
                        leave_type,
                        year,
                        previous,
                        now_ms,
                    )
                }
            };
            let debited = ledger::debit(&balance, current.days_requested, now_ms)?;
            t.leave_balances.insert(key, debited);
        }

        t.leave_requests.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn delete_leave_request(&self, id: &str) -> RepoResult<bool> {
        Ok(self.tables.lock().leave_requests.remove(id).is_some())
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<LeaveRequest>> {
        let rows = self.find_leave_requests(filter).await?;
        Ok(page.apply(rows))
    }

    async fn find_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let mut rows: Vec<LeaveRequest> = {
            let t = self.tables.lock();
            t.leave_requests
                .values()
                .filter(|r| filter.matches(r) && t.in_department(&r.user_id, &filter.department_id))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn list_leave_balances(
        &self,
        user_id: Option<&str>,
        year: i32,
    ) -> RepoResult<Vec<LeaveBalance>> {
        let mut rows: Vec<LeaveBalance> = {
            let t = self.tables.lock();
            t.leave_balances
                .values()
                .filter(|b| b.year == year && user_id.is_none_or(|u| b.user_id == u))
                .cloned()
                .collect()
        };
        rows.sort_by(|a, b| {
            a.user_id
                .cmp(&b.user_id)
                .then_with(|| a.leave_type_id.cmp(&b.leave_type_id))
        });
        Ok(rows)
    }

    async fn set_leave_allocation(
        &self,
        user_id: &str,
        leave_type_id: &str,
        year: i32,
        allocated_days: i32,
        now_ms: i64,
    ) -> RepoResult<LeaveBalance> {
        let mut t = self.tables.lock();
        let key = (user_id.to_string(), leave_type_id.to_string(), year);
        let next = match t.leave_balances.get(&key) {
            Some(existing) => ledger::reallocate(existing, allocated_days, now_ms)?,
            None => LeaveBalance {
                id: new_id(),
                user_id: user_id.to_string(),
                leave_type_id: leave_type_id.to_string(),
                year,
                allocated_days,
                used_days: 0,
                updated_at: now_ms,
            },
        };
        t.leave_balances.insert(key, next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceError;
    use shared::models::{AttendanceStatus, LeaveStatus};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn test_clock_in_on_absent_row() {
        let store = MemoryStore::new();
        let mut absent = machine::open_day("a1".into(), "u1", day(), 0, None);
        absent.clock_in = None;
        absent.status = AttendanceStatus::Absent;
        store
            .tables
            .lock()
            .attendance
            .insert(("u1".into(), day()), absent);

        let rec = store
            .clock_in("ignored".into(), "u1", day(), 100, None)
            .await
            .unwrap();
        assert_eq!(rec.id, "a1");
        assert_eq!(rec.status, AttendanceStatus::Present);

        let err = store
            .clock_in("x".into(), "u1", day(), 200, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Attendance(AttendanceError::AlreadyClockedIn)
        ));
    }

    #[tokio::test]
    async fn test_replace_attendance_detects_change() {
        let store = MemoryStore::new();
        let rec = store
            .clock_in("a1".into(), "u1", day(), 0, None)
            .await
            .unwrap();
        let on_break = machine::start_break(Some(&rec), 10).unwrap();
        assert!(store.replace_attendance(&rec, &on_break).await.unwrap());
        // Stale snapshot loses
        let out = machine::clock_out(Some(&rec), 20).unwrap();
        assert!(!store.replace_attendance(&rec, &out).await.unwrap());
    }

    #[tokio::test]
    async fn test_last_day_of_balance_single_approval() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store
            .set_leave_allocation("u1", "t1", 2025, 1, 0)
            .await
            .unwrap();
        let mut ids = Vec::new();
        for i in 0..2 {
            let req = LeaveRequest {
                id: format!("r{i}"),
                user_id: "u1".into(),
                leave_type_id: "t1".into(),
                start_date: day(),
                end_date: day(),
                days_requested: 1,
                reason: "Medical appointment".into(),
                status: LeaveStatus::Pending,
                approved_by: None,
                approved_at: None,
                comments: None,
                created_at: i,
                updated_at: i,
            };
            store.create_leave_request(&req).await.unwrap();
            ids.push(req.id);
        }

        let transition = LeaveTransition::Approve {
            approver_id: "m1".into(),
            enforce_balance: true,
        };
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let store = store.clone();
                let transition = transition.clone();
                tokio::spawn(async move {
                    store.transition_leave_request(&id, &transition, 5).await
                })
            })
            .collect();

        let mut approved = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => approved += 1,
                Err(e) => assert!(matches!(
                    e,
                    RepoError::Leave(LeaveError::InsufficientBalance { .. })
                )),
            }
        }
        assert_eq!(approved, 1);
        let balances = store.list_leave_balances(Some("u1"), 2025).await.unwrap();
        assert_eq!(balances[0].remaining_days(), 0);
    }

    #[tokio::test]
    async fn test_reallocation_racing_approval_keeps_used_covered() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store
            .set_leave_allocation("u1", "t1", 2025, 5, 0)
            .await
            .unwrap();
        let req = LeaveRequest {
            id: "r1".into(),
            user_id: "u1".into(),
            leave_type_id: "t1".into(),
            start_date: day(),
            end_date: day() + chrono::Duration::days(2),
            days_requested: 3,
            reason: "Family commitments".into(),
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            comments: None,
            created_at: 0,
            updated_at: 0,
        };
        store.create_leave_request(&req).await.unwrap();

        let approving = {
            let store = store.clone();
            tokio::spawn(async move {
                let transition = LeaveTransition::Approve {
                    approver_id: "m1".into(),
                    enforce_balance: true,
                };
                store.transition_leave_request("r1", &transition, 5).await
            })
        };
        let shrinking = {
            let store = store.clone();
            tokio::spawn(async move { store.set_leave_allocation("u1", "t1", 2025, 2, 6).await })
        };
        let approved = approving.await.unwrap().is_ok();
        let shrunk = shrinking.await.unwrap().is_ok();
        assert!(approved != shrunk, "exactly one side wins");

        let balances = store.list_leave_balances(Some("u1"), 2025).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert!(balances[0].used_days <= balances[0].allocated_days);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let a = super::super::seed::demo_user_record("u1", "EMP001", "a@example.com", "r", "h");
        let mut b = super::super::seed::demo_user_record("u2", "EMP002", "a@example.com", "r", "h");
        store.create_user(&a).await.unwrap();
        assert!(matches!(
            store.create_user(&b).await,
            Err(RepoError::Duplicate(_))
        ));
        b.user.email = "b@example.com".into();
        store.create_user(&b).await.unwrap();
    }
}
