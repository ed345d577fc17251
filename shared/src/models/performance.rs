//! Performance Model (绩效)
//!
//! Reviews rate an employee over a period; goals track individual targets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Review workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
}

impl ReviewStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
        }
    }
}

/// Performance review of one employee
///
/// Ratings are on a 1..=5 scale and optional until the review is filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    pub id: String,
    pub employee_id: String,
    pub reviewer_id: String,
    pub review_period_start: NaiveDate,
    pub review_period_end: NaiveDate,
    pub overall_rating: Option<i32>,
    pub goals_achievement: Option<i32>,
    pub competency_rating: Option<i32>,
    pub feedback: Option<String>,
    pub improvement_areas: Option<String>,
    pub status: ReviewStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Goal progress status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(Self::NotStarted),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Individual goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    /// Percent complete, 0..=100
    pub progress: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Year-to-date review and goal figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceOverview {
    pub total_reviews: u64,
    pub completed_reviews: u64,
    /// Mean overall rating of approved reviews, 0 when there are none
    pub average_rating: f64,
    pub total_goals: u64,
    pub completed_goals: u64,
    /// Percent, 0 when there is nothing to complete
    pub review_completion_rate: f64,
    pub goal_completion_rate: f64,
}
