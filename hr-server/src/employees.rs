//! Employee accounts: creation, views, deactivation and activity counters

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::models::{Employee, EmployeeStats, LeaveStatus, Profile, Role, User, UserStatus};
use shared::util::{new_id, normalize_email};
use shared::{AppError, AppResult, ErrorCode, PageQuery, PaginatedResponse};

use crate::attendance::summary;
use crate::auth::password::hash_password;
use crate::db::{
    AttendanceFilter, LeaveRequestFilter, RepoError, Store, TimeEntryFilter, UserFilter,
    UserRecord,
};
use crate::departments;
use crate::utils::time::{current_month, month_bounds};

/// Fields of a new account
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub employee_id: String,
    pub email: String,
    pub password: String,
    pub role_id: String,
    pub department_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
}

/// Cheap identity lookup, run before the argon2 hash is paid for
pub async fn ensure_identity_free(
    store: &dyn Store,
    email: &str,
    employee_id: &str,
) -> AppResult<()> {
    if store.identity_exists(email, employee_id).await? {
        return Err(AppError::new(ErrorCode::DuplicateIdentity));
    }
    Ok(())
}

/// Create user and profile; a taken email or employee id is `DuplicateIdentity`
///
/// The store insert still enforces uniqueness for concurrent creators.
pub async fn create_employee(
    store: &dyn Store,
    input: NewEmployee,
    now_ms: i64,
) -> AppResult<UserRecord> {
    let email = normalize_email(&input.email);
    let employee_id = input.employee_id.trim().to_string();
    ensure_identity_free(store, &email, &employee_id).await?;
    departments::ensure_exists(store, input.department_id.as_deref()).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let id = new_id();
    let record = UserRecord {
        user: User {
            id: id.clone(),
            employee_id,
            email,
            role_id: input.role_id,
            department_id: input.department_id,
            status: UserStatus::Active,
            created_at: now_ms,
            updated_at: now_ms,
        },
        profile: Profile {
            user_id: id,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            position: input.position,
            hire_date: input.hire_date,
            salary: input.salary,
            ..Default::default()
        },
        password_hash,
    };

    match store.create_user(&record).await {
        Ok(()) => {}
        Err(RepoError::Duplicate(_)) => {
            return Err(AppError::new(ErrorCode::DuplicateIdentity));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(
        user_id = %record.user.id,
        employee_id = %record.user.employee_id,
        "Employee account created"
    );
    Ok(record)
}

pub async fn find_record(store: &dyn Store, id: &str) -> AppResult<UserRecord> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::EmployeeNotFound))
}

async fn role_names(store: &dyn Store) -> AppResult<HashMap<String, String>> {
    Ok(store
        .list_roles()
        .await?
        .into_iter()
        .map(|r: Role| (r.id, r.name))
        .collect())
}

/// Role and department names joined onto user rows
struct Names {
    roles: HashMap<String, String>,
    departments: HashMap<String, String>,
}

impl Names {
    async fn load(store: &dyn Store) -> AppResult<Self> {
        Ok(Self {
            roles: role_names(store).await?,
            departments: departments::names(store).await?,
        })
    }

    fn employee(&self, record: UserRecord) -> Employee {
        let role_name = self
            .roles
            .get(&record.user.role_id)
            .cloned()
            .unwrap_or_default();
        let department_name = record
            .user
            .department_id
            .as_ref()
            .and_then(|id| self.departments.get(id))
            .cloned();
        Employee {
            user: record.user,
            role_name,
            department_name,
            profile: record.profile,
        }
    }
}

pub async fn view(store: &dyn Store, record: UserRecord) -> AppResult<Employee> {
    Ok(Names::load(store).await?.employee(record))
}

pub async fn list(
    store: &dyn Store,
    filter: &UserFilter,
    page: PageQuery,
) -> AppResult<PaginatedResponse<Employee>> {
    let names = Names::load(store).await?;
    let records = store.list_users(filter, page).await?;
    Ok(records.map(|r| names.employee(r)))
}

/// Persist edited user and profile fields, keeping the credential hash
pub async fn save(store: &dyn Store, record: &UserRecord) -> AppResult<()> {
    match store.update_user(&record.user, &record.profile).await {
        Ok(()) => Ok(()),
        Err(RepoError::Duplicate(_)) => Err(AppError::new(ErrorCode::DuplicateIdentity)),
        Err(RepoError::NotFound(_)) => Err(AppError::new(ErrorCode::EmployeeNotFound)),
        Err(e) => Err(e.into()),
    }
}

/// Soft delete: status becomes INACTIVE, nothing is removed
pub async fn deactivate(
    store: &dyn Store,
    caller_id: &str,
    id: &str,
    now_ms: i64,
) -> AppResult<UserRecord> {
    if caller_id == id {
        return Err(AppError::new(ErrorCode::EmployeeCannotDeleteSelf));
    }
    let mut record = find_record(store, id).await?;
    record.user.status = UserStatus::Inactive;
    record.user.updated_at = now_ms;
    save(store, &record).await?;
    tracing::info!(user_id = %id, deactivated_by = %caller_id, "Employee deactivated");
    Ok(record)
}

pub async fn stats(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<EmployeeStats> {
    let (year, month) = current_month(now, tz);
    let (first, last) = month_bounds(year, month)?;
    let attendance = store
        .find_attendance_range(&AttendanceFilter {
            user_id: Some(user_id.to_string()),
            start_date: Some(first),
            end_date: Some(last),
            ..Default::default()
        })
        .await?;
    let requests = store
        .find_leave_requests(&LeaveRequestFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        })
        .await?;
    let entries = store
        .list_time_entries(&TimeEntryFilter {
            user_id: user_id.to_string(),
            from: None,
            until: None,
        })
        .await?;

    Ok(EmployeeStats {
        attendance_days_this_month: attendance.len() as u64,
        hours_this_month: summary::totals(&attendance).total_hours,
        leave_requests: requests.len() as u64,
        pending_leave_requests: requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Pending)
            .count() as u64,
        time_entries: entries.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, seed};

    fn input(employee_id: &str, email: &str) -> NewEmployee {
        NewEmployee {
            employee_id: employee_id.into(),
            email: email.into(),
            password: "password123".into(),
            role_id: "r-employee".into(),
            department_id: None,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            phone: None,
            position: None,
            hire_date: None,
            salary: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let record = create_employee(&store, input("EMP100", " Grace@Example.com "), 1)
            .await
            .unwrap();
        assert_eq!(record.user.email, "grace@example.com");
        assert_ne!(record.password_hash, "password123");

        let err = create_employee(&store, input("EMP101", "grace@example.com"), 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIdentity);
        let err = create_employee(&store, input("EMP100", "other@example.com"), 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIdentity);
    }

    #[tokio::test]
    async fn test_identity_checked_before_hashing() {
        let store = MemoryStore::new();
        create_employee(&store, input("EMP100", "grace@example.com"), 1)
            .await
            .unwrap();

        let err = ensure_identity_free(&store, "grace@example.com", "EMP999")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIdentity);
        let err = ensure_identity_free(&store, "new@example.com", "EMP100")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIdentity);
        ensure_identity_free(&store, "new@example.com", "EMP101")
            .await
            .unwrap();

        // A padded employee id still collides once trimmed
        let err = create_employee(&store, input(" EMP100 ", "x@example.com"), 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIdentity);
    }

    #[tokio::test]
    async fn test_department_is_checked_and_named() {
        let store = MemoryStore::new();
        let catalog = seed::seed_departments(&store, 0).await.unwrap();
        let finance = &catalog["Finance"];

        let mut unknown = input("EMP100", "grace@example.com");
        unknown.department_id = Some("missing".into());
        let err = create_employee(&store, unknown, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DepartmentNotFound);

        let mut new = input("EMP100", "grace@example.com");
        new.department_id = Some(finance.id.clone());
        let record = create_employee(&store, new, 1).await.unwrap();
        let employee = view(&store, record).await.unwrap();
        assert_eq!(employee.department_name.as_deref(), Some("Finance"));

        let listed = list(
            &store,
            &UserFilter {
                department_id: Some(finance.id.clone()),
                ..Default::default()
            },
            PageQuery::new(1, 10),
        )
        .await
        .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.data[0].user.id, employee.user.id);
    }

    #[tokio::test]
    async fn test_deactivate() {
        let store = MemoryStore::new();
        let roles = seed::seed_roles(&store, 0).await.unwrap();
        let mut new = input("EMP100", "grace@example.com");
        new.role_id = roles[&crate::auth::SystemRole::Employee].id.clone();
        let record = create_employee(&store, new, 1).await.unwrap();

        let err = deactivate(&store, &record.user.id, &record.user.id, 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmployeeCannotDeleteSelf);

        let updated = deactivate(&store, "admin", &record.user.id, 2).await.unwrap();
        assert_eq!(updated.user.status, UserStatus::Inactive);
        let stored = find_record(&store, &record.user.id).await.unwrap();
        assert_eq!(stored.user.status, UserStatus::Inactive);
        assert_eq!(stored.password_hash, record.password_hash);

        let employee = view(&store, stored).await.unwrap();
        assert_eq!(employee.role_name, "Employee");
    }

    #[tokio::test]
    async fn test_stats_for_new_employee_are_zero() {
        let store = MemoryStore::new();
        let record = create_employee(&store, input("EMP100", "grace@example.com"), 1)
            .await
            .unwrap();
        let stats = stats(&store, &record.user.id, Utc::now(), chrono_tz::UTC)
            .await
            .unwrap();
        assert_eq!(stats, EmployeeStats::default());
    }
}
