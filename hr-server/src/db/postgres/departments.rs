use async_trait::async_trait;
use shared::models::Department;

use super::PgStore;
use crate::db::{DepartmentStore, RepoError, RepoResult};

const SELECT_DEPARTMENT: &str =
    "SELECT id, name, description, budget, created_at FROM departments";

#[async_trait]
impl DepartmentStore for PgStore {
    async fn list_departments(&self) -> RepoResult<Vec<Department>> {
        Ok(sqlx::query_as(&format!("{SELECT_DEPARTMENT} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_department(&self, id: &str) -> RepoResult<Option<Department>> {
        Ok(sqlx::query_as(&format!("{SELECT_DEPARTMENT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_department(&self, department: &Department) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO departments (id, name, description, budget, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.budget)
        .bind(department.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_department(&self, department: &Department) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE departments SET name = $1, description = $2, budget = $3 WHERE id = $4",
        )
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.budget)
        .bind(&department.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("department {}", department.id)));
        }
        Ok(())
    }

    async fn ensure_department(&self, department: &Department) -> RepoResult<Department> {
        sqlx::query(
            "INSERT INTO departments (id, name, description, budget, created_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.budget)
        .bind(department.created_at)
        .execute(&self.pool)
        .await?;

        sqlx::query_as(&format!("{SELECT_DEPARTMENT} WHERE name = $1"))
            .bind(&department.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("department {}", department.name)))
    }
}
