//! PostgreSQL store (sqlx, runtime-checked queries)

mod attendance;
mod departments;
mod leave;
mod performance;
mod recruitment;
mod time_entries;
mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::RepoError;

const MAX_CONNECTIONS: u32 = 16;

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::RowNotFound => RepoError::NotFound("row".to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Invalid enum text in a row
fn corrupt(column: &str, value: &str) -> RepoError {
    RepoError::Database(format!("invalid {column} value: {value}"))
}

/// Restrict `user_column` to members of `department_id`
fn push_department<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    user_column: &str,
    department_id: &'a Option<String>,
) {
    if let Some(dept) = department_id {
        qb.push(format!(
            " AND {user_column} IN (SELECT id FROM users WHERE department_id = "
        ))
        .push_bind(dept)
        .push(")");
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
