//! Time Tracking Model

use serde::{Deserialize, Serialize};

/// Free-form time entry owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub project_name: Option<String>,
    pub task_description: String,
    /// UTC epoch milliseconds
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub billable: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TimeEntry {
    /// Elapsed hours, `None` while the entry is open
    pub fn hours(&self) -> Option<f64> {
        self.end_time
            .map(|end| ((end - self.start_time) as f64 / 3_600_000.0 * 100.0).round() / 100.0)
    }
}
