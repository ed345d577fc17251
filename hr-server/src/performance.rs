//! Performance reviews, goals and the year-to-date overview

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::models::{Goal, GoalStatus, PerformanceOverview, PerformanceReview, ReviewStatus};
use shared::util::new_id;
use shared::{AppError, AppResult, ErrorCode, PageQuery, PaginatedResponse};

use crate::db::{GoalFilter, RepoError, ReviewFilter, Store};
use crate::employees;
use crate::utils::time::business_date;

/// Editable review fields; the reviewed employee is fixed at creation
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub review_period_start: NaiveDate,
    pub review_period_end: NaiveDate,
    pub overall_rating: Option<i32>,
    pub goals_achievement: Option<i32>,
    pub competency_rating: Option<i32>,
    pub feedback: Option<String>,
    pub improvement_areas: Option<String>,
    pub status: Option<ReviewStatus>,
}

/// Editable goal fields
#[derive(Debug, Clone)]
pub struct GoalInput {
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
    pub progress: Option<i32>,
}

fn check_period(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::new(ErrorCode::InvalidReviewPeriod));
    }
    Ok(())
}

fn review_missing(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(_) => AppError::new(ErrorCode::ReviewNotFound),
        other => other.into(),
    }
}

fn goal_missing(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(_) => AppError::new(ErrorCode::GoalNotFound),
        other => other.into(),
    }
}

pub async fn find_review(store: &dyn Store, id: &str) -> AppResult<PerformanceReview> {
    store
        .find_review(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))
}

pub async fn list_reviews(
    store: &dyn Store,
    filter: &ReviewFilter,
    page: PageQuery,
) -> AppResult<PaginatedResponse<PerformanceReview>> {
    Ok(store.list_reviews(filter, page).await?)
}

/// New review of `employee_id` written by `reviewer_id`, DRAFT unless told otherwise
pub async fn create_review(
    store: &dyn Store,
    employee_id: &str,
    reviewer_id: &str,
    input: ReviewInput,
    now_ms: i64,
) -> AppResult<PerformanceReview> {
    check_period(input.review_period_start, input.review_period_end)?;
    employees::find_record(store, employee_id).await?;

    let review = PerformanceReview {
        id: new_id(),
        employee_id: employee_id.to_string(),
        reviewer_id: reviewer_id.to_string(),
        review_period_start: input.review_period_start,
        review_period_end: input.review_period_end,
        overall_rating: input.overall_rating,
        goals_achievement: input.goals_achievement,
        competency_rating: input.competency_rating,
        feedback: input.feedback,
        improvement_areas: input.improvement_areas,
        status: input.status.unwrap_or_default(),
        created_at: now_ms,
        updated_at: now_ms,
    };
    store.create_review(&review).await?;
    tracing::info!(
        review_id = %review.id,
        employee_id = %employee_id,
        reviewer_id = %reviewer_id,
        "Performance review created"
    );
    Ok(review)
}

pub async fn update_review(
    store: &dyn Store,
    id: &str,
    input: ReviewInput,
    now_ms: i64,
) -> AppResult<PerformanceReview> {
    check_period(input.review_period_start, input.review_period_end)?;
    let mut review = find_review(store, id).await?;
    review.review_period_start = input.review_period_start;
    review.review_period_end = input.review_period_end;
    review.overall_rating = input.overall_rating;
    review.goals_achievement = input.goals_achievement;
    review.competency_rating = input.competency_rating;
    review.feedback = input.feedback;
    review.improvement_areas = input.improvement_areas;
    if let Some(status) = input.status {
        review.status = status;
    }
    review.updated_at = now_ms;
    store.update_review(&review).await.map_err(review_missing)?;
    Ok(review)
}

pub async fn delete_review(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_review(id).await? {
        return Err(AppError::new(ErrorCode::ReviewNotFound));
    }
    Ok(())
}

pub async fn find_goal(store: &dyn Store, id: &str) -> AppResult<Goal> {
    store
        .find_goal(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GoalNotFound))
}

pub async fn list_goals(store: &dyn Store, filter: &GoalFilter) -> AppResult<Vec<Goal>> {
    Ok(store.list_goals(filter).await?)
}

pub async fn create_goal(
    store: &dyn Store,
    user_id: &str,
    input: GoalInput,
    now_ms: i64,
) -> AppResult<Goal> {
    employees::find_record(store, user_id).await?;
    let goal = Goal {
        id: new_id(),
        user_id: user_id.to_string(),
        title: input.title,
        description: input.description,
        target_date: input.target_date,
        status: input.status.unwrap_or_default(),
        progress: input.progress.unwrap_or(0),
        created_at: now_ms,
        updated_at: now_ms,
    };
    store.create_goal(&goal).await?;
    tracing::info!(goal_id = %goal.id, user_id = %user_id, "Goal created");
    Ok(goal)
}

/// Status and progress keep their stored values when omitted
pub async fn update_goal(
    store: &dyn Store,
    id: &str,
    input: GoalInput,
    now_ms: i64,
) -> AppResult<Goal> {
    let mut goal = find_goal(store, id).await?;
    goal.title = input.title;
    goal.description = input.description;
    goal.target_date = input.target_date;
    if let Some(status) = input.status {
        goal.status = status;
    }
    if let Some(progress) = input.progress {
        goal.progress = progress;
    }
    goal.updated_at = now_ms;
    store.update_goal(&goal).await.map_err(goal_missing)?;
    Ok(goal)
}

pub async fn delete_goal(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_goal(id).await? {
        return Err(AppError::new(ErrorCode::GoalNotFound));
    }
    Ok(())
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Reviews whose period starts this business year, and all goals
pub async fn overview(
    store: &dyn Store,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<PerformanceOverview> {
    let today = business_date(now, tz);
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
        .ok_or_else(|| AppError::internal("year start out of range"))?;

    let reviews = store
        .find_reviews(&ReviewFilter {
            period_start_since: Some(year_start),
            ..Default::default()
        })
        .await?;
    let approved: Vec<_> = reviews
        .iter()
        .filter(|r| r.status == ReviewStatus::Approved)
        .collect();
    let ratings: Vec<i32> = approved.iter().filter_map(|r| r.overall_rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64
    };

    let goals = store.list_goals(&GoalFilter::default()).await?;
    let completed_goals = goals
        .iter()
        .filter(|g| g.status == GoalStatus::Completed)
        .count() as u64;

    let total_reviews = reviews.len() as u64;
    let completed_reviews = approved.len() as u64;
    let total_goals = goals.len() as u64;
    Ok(PerformanceOverview {
        total_reviews,
        completed_reviews,
        average_rating,
        total_goals,
        completed_goals,
        review_completion_rate: percent(completed_reviews, total_reviews),
        goal_completion_rate: percent(completed_goals, total_goals),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UserStore, seed};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn review(start: NaiveDate, rating: Option<i32>, status: ReviewStatus) -> ReviewInput {
        ReviewInput {
            review_period_start: start,
            review_period_end: start + chrono::Duration::days(90),
            overall_rating: rating,
            goals_achievement: None,
            competency_rating: None,
            feedback: None,
            improvement_areas: None,
            status: Some(status),
        }
    }

    fn goal(title: &str) -> GoalInput {
        GoalInput {
            title: title.into(),
            description: None,
            target_date: None,
            status: None,
            progress: None,
        }
    }

    async fn store_with_employee() -> MemoryStore {
        let store = MemoryStore::new();
        let record = seed::demo_user_record("u1", "EMP001", "a@example.com", "r", "h");
        store.create_user(&record).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_review_lifecycle() {
        let store = store_with_employee().await;
        let draft = review(date(2026, 1, 1), None, ReviewStatus::Draft);
        let err = create_review(&store, "ghost", "mgr", draft, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmployeeNotFound);

        let mut backwards = review(date(2026, 1, 1), None, ReviewStatus::Draft);
        backwards.review_period_end = date(2025, 12, 31);
        let err = create_review(&store, "u1", "mgr", backwards, 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidReviewPeriod);

        let mut input = review(date(2026, 1, 1), None, ReviewStatus::Draft);
        input.status = None;
        let created = create_review(&store, "u1", "mgr", input, 1).await.unwrap();
        assert_eq!(created.status, ReviewStatus::Draft);
        assert_eq!(created.reviewer_id, "mgr");

        let updated = update_review(
            &store,
            &created.id,
            review(date(2026, 1, 1), Some(4), ReviewStatus::Approved),
            2,
        )
        .await
        .unwrap();
        assert_eq!(updated.overall_rating, Some(4));
        assert_eq!(find_review(&store, &created.id).await.unwrap(), updated);

        delete_review(&store, &created.id).await.unwrap();
        let err = delete_review(&store, &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReviewNotFound);
    }

    #[tokio::test]
    async fn test_goal_update_keeps_omitted_progress() {
        let store = store_with_employee().await;
        let mut input = goal("Ship the payroll export");
        input.progress = Some(40);
        input.status = Some(GoalStatus::InProgress);
        let created = create_goal(&store, "u1", input, 1).await.unwrap();

        let updated = update_goal(&store, &created.id, goal("Ship the payroll export v2"), 2)
            .await
            .unwrap();
        assert_eq!(updated.progress, 40);
        assert_eq!(updated.status, GoalStatus::InProgress);
        assert_eq!(updated.title, "Ship the payroll export v2");

        let err = update_goal(&store, "missing", goal("Anything at all"), 3)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::GoalNotFound);
    }

    #[tokio::test]
    async fn test_overview_counts_this_year_only() {
        let store = store_with_employee().await;
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();

        let empty = overview(&store, now, chrono_tz::UTC).await.unwrap();
        assert_eq!(empty, PerformanceOverview::default());

        for input in [
            review(date(2025, 10, 1), Some(1), ReviewStatus::Approved),
            review(date(2026, 1, 1), Some(5), ReviewStatus::Approved),
            review(date(2026, 4, 1), Some(4), ReviewStatus::Approved),
            review(date(2026, 4, 1), None, ReviewStatus::Draft),
        ] {
            create_review(&store, "u1", "mgr", input, 1).await.unwrap();
        }
        let mut done = goal("Finish onboarding");
        done.status = Some(GoalStatus::Completed);
        create_goal(&store, "u1", done, 1).await.unwrap();
        create_goal(&store, "u1", goal("Learn the ledger"), 1)
            .await
            .unwrap();

        let figures = overview(&store, now, chrono_tz::UTC).await.unwrap();
        assert_eq!(figures.total_reviews, 3);
        assert_eq!(figures.completed_reviews, 2);
        assert!((figures.average_rating - 4.5).abs() < 1e-9);
        assert!((figures.review_completion_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(figures.total_goals, 2);
        assert_eq!(figures.completed_goals, 1);
        assert!((figures.goal_completion_rate - 50.0).abs() < 1e-9);
    }
}
