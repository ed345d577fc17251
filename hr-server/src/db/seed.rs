//! Start-up provisioning
//!
//! System roles, departments and the default leave catalog are always
//! ensured. Demo accounts and the sample job posting are only created when
//! `SEED_DEMO_DATA` is on.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use shared::PageQuery;
use shared::models::{
    Department, EmploymentType, JobPosting, JobStatus, LeaveType, Profile, Role, User, UserStatus,
};
use shared::query::MAX_LIMIT;
use shared::util::new_id;

use super::{JobPostingFilter, RepoError, RepoResult, Store, UserRecord};
use crate::auth::password::hash_password;
use crate::auth::permissions::SystemRole;

/// (name, description, max days per year, carry forward)
const DEFAULT_LEAVE_TYPES: &[(&str, &str, i32, bool)] = &[
    ("Annual Leave", "Yearly vacation leave", 25, true),
    ("Sick Leave", "Medical leave", 10, false),
    ("Personal Leave", "Personal time off", 5, false),
    ("Maternity Leave", "Maternity leave", 90, false),
];

/// (name, description, budget)
const DEFAULT_DEPARTMENTS: &[(&str, &str, f64)] = &[
    ("Information Technology", "IT and software development", 500_000.0),
    ("Human Resources", "Human resources management", 200_000.0),
    ("Finance", "Financial management and accounting", 300_000.0),
    ("Marketing", "Marketing and communications", 250_000.0),
];

const SAMPLE_JOB_TITLE: &str = "Senior Developer";

struct DemoUser {
    employee_id: &'static str,
    email: &'static str,
    password: &'static str,
    role: SystemRole,
    first_name: &'static str,
    last_name: &'static str,
    department: &'static str,
    position: &'static str,
    hire_date: (i32, u32, u32),
    salary: f64,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        employee_id: "EMP001",
        email: "admin@example.com",
        password: "admin123",
        role: SystemRole::Administrator,
        first_name: "System",
        last_name: "Administrator",
        department: "Information Technology",
        position: "System Administrator",
        hire_date: (2024, 1, 1),
        salary: 100_000.0,
    },
    DemoUser {
        employee_id: "EMP002",
        email: "hr@example.com",
        password: "hrmanager123",
        role: SystemRole::HrManager,
        first_name: "Sarah",
        last_name: "Johnson",
        department: "Human Resources",
        position: "HR Manager",
        hire_date: (2024, 1, 15),
        salary: 80_000.0,
    },
    DemoUser {
        employee_id: "EMP003",
        email: "manager@example.com",
        password: "manager123",
        role: SystemRole::Manager,
        first_name: "John",
        last_name: "Smith",
        department: "Information Technology",
        position: "Engineering Manager",
        hire_date: (2024, 2, 1),
        salary: 75_000.0,
    },
    DemoUser {
        employee_id: "EMP004",
        email: "employee@example.com",
        password: "employee123",
        role: SystemRole::Employee,
        first_name: "Lisa",
        last_name: "Wong",
        department: "Marketing",
        position: "Marketing Specialist",
        hire_date: (2024, 2, 1),
        salary: 60_000.0,
    },
];

/// Ensure the four system roles exist; returns them keyed by kind
pub async fn seed_roles(store: &dyn Store, now_ms: i64) -> RepoResult<HashMap<SystemRole, Role>> {
    let mut roles = HashMap::new();
    for &kind in SystemRole::ALL {
        let role = store
            .ensure_role(&Role {
                id: new_id(),
                name: kind.name().to_string(),
                description: Some(kind.description().to_string()),
                permissions: kind.default_permissions(),
                created_at: now_ms,
            })
            .await?;
        roles.insert(kind, role);
    }
    Ok(roles)
}

/// Ensure the default departments exist; returns them keyed by name
pub async fn seed_departments(
    store: &dyn Store,
    now_ms: i64,
) -> RepoResult<HashMap<String, Department>> {
    let mut departments = HashMap::new();
    for &(name, description, budget) in DEFAULT_DEPARTMENTS {
        let department = store
            .ensure_department(&Department {
                id: new_id(),
                name: name.to_string(),
                description: Some(description.to_string()),
                budget: Some(budget),
                created_at: now_ms,
            })
            .await?;
        departments.insert(department.name.clone(), department);
    }
    Ok(departments)
}

/// Ensure the default leave catalog exists (matched by name)
pub async fn seed_leave_types(store: &dyn Store, now_ms: i64) -> RepoResult<()> {
    let existing = store.list_leave_types(true).await?;
    for &(name, description, max_days, carry_forward) in DEFAULT_LEAVE_TYPES {
        if existing.iter().any(|t| t.name == name) {
            continue;
        }
        let leave_type = LeaveType {
            id: new_id(),
            name: name.to_string(),
            description: Some(description.to_string()),
            max_days_per_year: max_days,
            carry_forward,
            is_active: true,
            created_at: now_ms,
        };
        match store.create_leave_type(&leave_type).await {
            // Another instance won the race
            Ok(()) | Err(RepoError::Duplicate(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Minimal active user with an empty profile
pub fn demo_user_record(
    id: &str,
    employee_id: &str,
    email: &str,
    role_id: &str,
    password_hash: &str,
) -> UserRecord {
    UserRecord {
        user: User {
            id: id.to_string(),
            employee_id: employee_id.to_string(),
            email: email.to_string(),
            role_id: role_id.to_string(),
            department_id: None,
            status: UserStatus::Active,
            created_at: 0,
            updated_at: 0,
        },
        profile: Profile {
            user_id: id.to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            ..Default::default()
        },
        password_hash: password_hash.to_string(),
    }
}

/// Create the demo accounts that do not exist yet
pub async fn seed_demo_users(
    store: &dyn Store,
    roles: &HashMap<SystemRole, Role>,
    departments: &HashMap<String, Department>,
    now_ms: i64,
) -> anyhow::Result<()> {
    for demo in DEMO_USERS {
        if store.find_user_by_email(demo.email).await?.is_some() {
            continue;
        }
        let Some(role) = roles.get(&demo.role) else {
            anyhow::bail!("role {} was not provisioned", demo.role.name());
        };
        let hash = hash_password(demo.password)
            .map_err(|e| anyhow::anyhow!("failed to hash demo password: {e}"))?;

        let id = new_id();
        let mut record = demo_user_record(&id, demo.employee_id, demo.email, &role.id, &hash);
        record.user.department_id = departments.get(demo.department).map(|d| d.id.clone());
        record.user.created_at = now_ms;
        record.user.updated_at = now_ms;
        let (y, m, d) = demo.hire_date;
        record.profile = Profile {
            user_id: id.clone(),
            first_name: demo.first_name.to_string(),
            last_name: demo.last_name.to_string(),
            position: Some(demo.position.to_string()),
            hire_date: NaiveDate::from_ymd_opt(y, m, d),
            salary: Some(demo.salary),
            ..Default::default()
        };

        match store.create_user(&record).await {
            Ok(()) => {
                tracing::info!(email = demo.email, role = demo.role.name(), "Demo user created")
            }
            Err(RepoError::Duplicate(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Open the sample posting in IT unless a posting with its title exists
async fn seed_sample_job(
    store: &dyn Store,
    departments: &HashMap<String, Department>,
    now_ms: i64,
) -> anyhow::Result<()> {
    let Some(it) = departments.get("Information Technology") else {
        return Ok(());
    };
    let Some(admin) = store.find_user_by_email("admin@example.com").await? else {
        return Ok(());
    };
    let existing = store
        .list_job_postings(&JobPostingFilter::default(), PageQuery::new(1, MAX_LIMIT))
        .await?;
    if existing.data.iter().any(|j| j.title == SAMPLE_JOB_TITLE) {
        return Ok(());
    }

    let closing = chrono::DateTime::from_timestamp_millis(now_ms)
        .map(|t| (t + Duration::days(30)).date_naive());
    store
        .create_job_posting(&JobPosting {
            id: new_id(),
            title: SAMPLE_JOB_TITLE.to_string(),
            department_id: it.id.clone(),
            description: "We are looking for a senior developer to join our team and own \
                          services end to end."
                .to_string(),
            requirements: Some(
                "Bachelor's degree in Computer Science, 5+ years experience".to_string(),
            ),
            salary_range: Some("$70,000 - $90,000".to_string()),
            employment_type: EmploymentType::FullTime,
            location: Some("Remote / Office".to_string()),
            status: JobStatus::Active,
            posted_by: admin.user.id,
            posted_at: Some(now_ms),
            closing_date: closing,
            created_at: now_ms,
            updated_at: now_ms,
        })
        .await?;
    tracing::info!(title = SAMPLE_JOB_TITLE, "Sample job posting created");
    Ok(())
}

/// Provision roles, departments, leave types and (optionally) demo data
pub async fn bootstrap(
    store: &dyn Store,
    with_demo_users: bool,
    now_ms: i64,
) -> anyhow::Result<()> {
    let roles = seed_roles(store, now_ms).await?;
    let departments = seed_departments(store, now_ms).await?;
    seed_leave_types(store, now_ms).await?;
    if with_demo_users {
        seed_demo_users(store, &roles, &departments, now_ms).await?;
        seed_sample_job(store, &departments, now_ms).await?;
    }
    tracing::info!(
        roles = roles.len(),
        departments = departments.len(),
        demo_users = with_demo_users,
        "Store provisioned"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        DepartmentStore, LeaveStore, MemoryStore, RecruitmentStore, UserFilter, UserStore,
    };

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = MemoryStore::new();
        bootstrap(&store, false, 0).await.unwrap();
        bootstrap(&store, false, 1).await.unwrap();

        assert_eq!(store.list_roles().await.unwrap().len(), 4);
        assert_eq!(store.list_leave_types(true).await.unwrap().len(), 4);
        assert_eq!(store.list_departments().await.unwrap().len(), 4);
        let admin = store
            .find_role_by_name("Administrator")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.permissions.iter().any(|p| p == "*"));
    }

    #[tokio::test]
    async fn test_demo_data_links_departments() {
        let store = MemoryStore::new();
        bootstrap(&store, true, 0).await.unwrap();
        bootstrap(&store, true, 1).await.unwrap();

        let departments = store.list_departments().await.unwrap();
        let it = departments
            .iter()
            .find(|d| d.name == "Information Technology")
            .unwrap();
        assert_eq!(it.budget, Some(500_000.0));

        let in_it = store
            .count_users(&UserFilter {
                department_id: Some(it.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_it, 2);

        let jobs = store
            .count_job_postings(&JobPostingFilter {
                department_id: Some(it.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(jobs, 1);
    }
}
