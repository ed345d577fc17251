use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{Goal, GoalStatus, PerformanceReview, ReviewStatus};
use shared::{PageQuery, PaginatedResponse};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, corrupt, push_department};
use crate::db::{GoalFilter, PerformanceStore, RepoError, RepoResult, ReviewFilter};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    employee_id: String,
    reviewer_id: String,
    review_period_start: NaiveDate,
    review_period_end: NaiveDate,
    overall_rating: Option<i32>,
    goals_achievement: Option<i32>,
    competency_rating: Option<i32>,
    feedback: Option<String>,
    improvement_areas: Option<String>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ReviewRow> for PerformanceReview {
    type Error = RepoError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let status = ReviewStatus::from_db(&row.status)
            .ok_or_else(|| corrupt("review status", &row.status))?;
        Ok(PerformanceReview {
            id: row.id,
            employee_id: row.employee_id,
            reviewer_id: row.reviewer_id,
            review_period_start: row.review_period_start,
            review_period_end: row.review_period_end,
            overall_rating: row.overall_rating,
            goals_achievement: row.goals_achievement,
            competency_rating: row.competency_rating,
            feedback: row.feedback,
            improvement_areas: row.improvement_areas,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    target_date: Option<NaiveDate>,
    status: String,
    progress: i32,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<GoalRow> for Goal {
    type Error = RepoError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let status =
            GoalStatus::from_db(&row.status).ok_or_else(|| corrupt("goal status", &row.status))?;
        Ok(Goal {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            target_date: row.target_date,
            status,
            progress: row.progress,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_review_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ReviewFilter) {
    qb.push(" WHERE TRUE");
    if let Some(employee_id) = &filter.employee_id {
        qb.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(since) = filter.period_start_since {
        qb.push(" AND review_period_start >= ").push_bind(since);
    }
    if let Some(until) = filter.period_start_until {
        qb.push(" AND review_period_start <= ").push_bind(until);
    }
    push_department(qb, "employee_id", &filter.department_id);
}

fn collect_reviews(rows: Vec<ReviewRow>) -> RepoResult<Vec<PerformanceReview>> {
    rows.into_iter().map(PerformanceReview::try_from).collect()
}

#[async_trait]
impl PerformanceStore for PgStore {
    async fn create_review(&self, review: &PerformanceReview) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO performance_reviews (id, employee_id, reviewer_id, review_period_start, \
             review_period_end, overall_rating, goals_achievement, competency_rating, feedback, \
             improvement_areas, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&review.id)
        .bind(&review.employee_id)
        .bind(&review.reviewer_id)
        .bind(review.review_period_start)
        .bind(review.review_period_end)
        .bind(review.overall_rating)
        .bind(review.goals_achievement)
        .bind(review.competency_rating)
        .bind(&review.feedback)
        .bind(&review.improvement_areas)
        .bind(review.status.as_db())
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_review(&self, id: &str) -> RepoResult<Option<PerformanceReview>> {
        let row: Option<ReviewRow> =
            sqlx::query_as("SELECT * FROM performance_reviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(PerformanceReview::try_from).transpose()
    }

    async fn update_review(&self, review: &PerformanceReview) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE performance_reviews SET review_period_start = $1, review_period_end = $2, \
             overall_rating = $3, goals_achievement = $4, competency_rating = $5, \
             feedback = $6, improvement_areas = $7, status = $8, updated_at = $9 WHERE id = $10",
        )
        .bind(review.review_period_start)
        .bind(review.review_period_end)
        .bind(review.overall_rating)
        .bind(review.goals_achievement)
        .bind(review.competency_rating)
        .bind(&review.feedback)
        .bind(&review.improvement_areas)
        .bind(review.status.as_db())
        .bind(review.updated_at)
        .bind(&review.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("review {}", review.id)));
        }
        Ok(())
    }

    async fn delete_review(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM performance_reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<PerformanceReview>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM performance_reviews");
        push_review_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new("SELECT * FROM performance_reviews");
        push_review_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<ReviewRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(PaginatedResponse::new(
            collect_reviews(rows)?,
            total as u64,
            page.page(),
            page.limit(),
        ))
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> RepoResult<Vec<PerformanceReview>> {
        let mut qb = QueryBuilder::new("SELECT * FROM performance_reviews");
        push_review_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id");
        let rows: Vec<ReviewRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        collect_reviews(rows)
    }

    async fn create_goal(&self, goal: &Goal) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO goals (id, user_id, title, description, target_date, status, progress, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&goal.id)
        .bind(&goal.user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_date)
        .bind(goal.status.as_db())
        .bind(goal.progress)
        .bind(goal.created_at)
        .bind(goal.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_goal(&self, id: &str) -> RepoResult<Option<Goal>> {
        let row: Option<GoalRow> = sqlx::query_as("SELECT * FROM goals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Goal::try_from).transpose()
    }

    async fn update_goal(&self, goal: &Goal) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE goals SET title = $1, description = $2, target_date = $3, status = $4, \
             progress = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_date)
        .bind(goal.status.as_db())
        .bind(goal.progress)
        .bind(goal.updated_at)
        .bind(&goal.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("goal {}", goal.id)));
        }
        Ok(())
    }

    async fn delete_goal(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_goals(&self, filter: &GoalFilter) -> RepoResult<Vec<Goal>> {
        let mut qb = QueryBuilder::new("SELECT * FROM goals WHERE TRUE");
        if let Some(user_id) = &filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_db());
        }
        qb.push(" ORDER BY created_at DESC, id");
        let rows: Vec<GoalRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Goal::try_from).collect()
    }
}
