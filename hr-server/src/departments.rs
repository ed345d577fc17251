//! Department catalog and head counts

use std::collections::HashMap;

use shared::models::{Department, DepartmentHeadcount, UserStatus};
use shared::util::new_id;
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{RepoError, Store, UserFilter};

/// Editable department fields
#[derive(Debug, Clone)]
pub struct DepartmentInput {
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
}

fn name_taken(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::DepartmentNameExists),
        RepoError::NotFound(_) => AppError::new(ErrorCode::DepartmentNotFound),
        other => other.into(),
    }
}

pub async fn find(store: &dyn Store, id: &str) -> AppResult<Department> {
    store
        .find_department(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::DepartmentNotFound))
}

/// `DepartmentNotFound` unless `id` is absent or names a catalog entry
pub async fn ensure_exists(store: &dyn Store, id: Option<&str>) -> AppResult<()> {
    if let Some(id) = id {
        find(store, id).await?;
    }
    Ok(())
}

/// id -> name, for employee views
pub async fn names(store: &dyn Store) -> AppResult<HashMap<String, String>> {
    Ok(store
        .list_departments()
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect())
}

pub async fn create(
    store: &dyn Store,
    input: DepartmentInput,
    now_ms: i64,
) -> AppResult<Department> {
    let department = Department {
        id: new_id(),
        name: input.name,
        description: input.description,
        budget: input.budget,
        created_at: now_ms,
    };
    store
        .create_department(&department)
        .await
        .map_err(name_taken)?;
    tracing::info!(department_id = %department.id, name = %department.name, "Department created");
    Ok(department)
}

pub async fn update(store: &dyn Store, id: &str, input: DepartmentInput) -> AppResult<Department> {
    let mut department = find(store, id).await?;
    department.name = input.name;
    department.description = input.description;
    department.budget = input.budget;
    store
        .update_department(&department)
        .await
        .map_err(name_taken)?;
    Ok(department)
}

/// Active employees per department, catalog order, unassigned last when any
pub async fn headcount(store: &dyn Store) -> AppResult<Vec<DepartmentHeadcount>> {
    let mut rows = Vec::new();
    let mut assigned = 0;
    for department in store.list_departments().await? {
        let employees = store
            .count_users(&UserFilter {
                status: Some(UserStatus::Active),
                department_id: Some(department.id.clone()),
                ..Default::default()
            })
            .await?;
        assigned += employees;
        rows.push(DepartmentHeadcount {
            department_id: Some(department.id),
            department_name: Some(department.name),
            employees,
        });
    }

    let active = store
        .count_users(&UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        })
        .await?;
    let unassigned = active.saturating_sub(assigned);
    if unassigned > 0 {
        rows.push(DepartmentHeadcount {
            department_id: None,
            department_name: None,
            employees: unassigned,
        });
    }
    Ok(rows)
}
