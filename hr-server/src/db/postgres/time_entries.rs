use async_trait::async_trait;
use shared::models::TimeEntry;
use sqlx::{Postgres, QueryBuilder};

use super::PgStore;
use crate::db::{RepoError, RepoResult, TimeEntryFilter, TimeEntryStore};

#[async_trait]
impl TimeEntryStore for PgStore {
    async fn create_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO time_entries (id, user_id, project_name, task_description, start_time, \
             end_time, billable, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.project_name)
        .bind(&entry.task_description)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.billable)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_time_entry(&self, id: &str) -> RepoResult<Option<TimeEntry>> {
        Ok(sqlx::query_as("SELECT * FROM time_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE time_entries SET project_name = $1, task_description = $2, start_time = $3, \
             end_time = $4, billable = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&entry.project_name)
        .bind(&entry.task_description)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.billable)
        .bind(entry.updated_at)
        .bind(&entry.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("time entry {}", entry.id)));
        }
        Ok(())
    }

    async fn delete_time_entry(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_time_entries(&self, filter: &TimeEntryFilter) -> RepoResult<Vec<TimeEntry>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM time_entries WHERE user_id = ");
        qb.push_bind(&filter.user_id);
        if let Some(from) = filter.from {
            qb.push(" AND start_time >= ").push_bind(from);
        }
        if let Some(until) = filter.until {
            qb.push(" AND start_time < ").push_bind(until);
        }
        qb.push(" ORDER BY start_time DESC");
        Ok(qb.build_query_as().fetch_all(&self.pool).await?)
    }
}
