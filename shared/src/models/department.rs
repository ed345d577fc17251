//! Department Model (部门)

use serde::{Deserialize, Serialize};

/// Organisational unit an employee belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Department {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Annual budget, currency-agnostic
    pub budget: Option<f64>,
    pub created_at: i64,
}

/// Head count of one department (`None` groups unassigned employees)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentHeadcount {
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub employees: u64,
}
