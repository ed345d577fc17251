use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use shared::models::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
use shared::util::new_id;
use shared::{PageQuery, PaginatedResponse};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{PgStore, corrupt, push_department};
use crate::db::{LeaveRequestFilter, LeaveStore, RepoError, RepoResult};
use crate::leave::{LeaveError, LeaveTransition, ledger, lifecycle};

const SELECT_BALANCE: &str = "SELECT id, user_id, leave_type_id, year, allocated_days, used_days, \
     updated_at FROM leave_balances WHERE user_id = $1 AND leave_type_id = $2 AND year = $3";

#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id: String,
    user_id: String,
    leave_type_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_requested: i32,
    reason: String,
    status: String,
    approved_by: Option<String>,
    approved_at: Option<i64>,
    comments: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = RepoError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let status =
            LeaveStatus::from_db(&row.status).ok_or_else(|| corrupt("leave status", &row.status))?;
        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            leave_type_id: row.leave_type_id,
            start_date: row.start_date,
            end_date: row.end_date,
            days_requested: row.days_requested,
            reason: row.reason,
            status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            comments: row.comments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a LeaveRequestFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(type_id) = &filter.leave_type_id {
        qb.push(" AND leave_type_id = ").push_bind(type_id);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND start_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND start_date <= ").push_bind(end);
    }
    if let Some(day) = filter.covering {
        qb.push(" AND start_date <= ")
            .push_bind(day)
            .push(" AND end_date >= ")
            .push_bind(day);
    }
    push_department(qb, "user_id", &filter.department_id);
}

fn collect(rows: Vec<LeaveRequestRow>) -> RepoResult<Vec<LeaveRequest>> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

async fn lock_balance(
    conn: &mut PgConnection,
    user_id: &str,
    leave_type_id: &str,
    year: i32,
) -> RepoResult<Option<LeaveBalance>> {
    Ok(sqlx::query_as(&format!("{SELECT_BALANCE} FOR UPDATE"))
        .bind(user_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(conn)
        .await?)
}

/// Locked balance row of (user, type, year), opened first when missing
async fn lock_or_open_balance(
    conn: &mut PgConnection,
    request: &LeaveRequest,
    year: i32,
    now_ms: i64,
) -> RepoResult<LeaveBalance> {
    if let Some(balance) =
        lock_balance(&mut *conn, &request.user_id, &request.leave_type_id, year).await?
    {
        return Ok(balance);
    }

    let leave_type: LeaveType = sqlx::query_as("SELECT * FROM leave_types WHERE id = $1")
        .bind(&request.leave_type_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(LeaveError::LeaveTypeNotFound)?;
    let previous: Option<LeaveBalance> = sqlx::query_as(SELECT_BALANCE)
        .bind(&request.user_id)
        .bind(&request.leave_type_id)
        .bind(year - 1)
        .fetch_optional(&mut *conn)
        .await?;
    let opening = ledger::opening_balance(
        new_id(),
        &request.user_id,
        &leave_type,
        year,
        previous.as_ref(),
        now_ms,
    );

    insert_balance_if_absent(&mut *conn, &opening).await?;
    lock_balance(conn, &request.user_id, &request.leave_type_id, year)
        .await?
        .ok_or_else(|| RepoError::Database("leave balance vanished after insert".to_string()))
}

/// Concurrent openers converge on one row through the unique key
async fn insert_balance_if_absent(
    conn: &mut PgConnection,
    balance: &LeaveBalance,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO leave_balances (id, user_id, leave_type_id, year, allocated_days, \
         used_days, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (user_id, leave_type_id, year) DO NOTHING",
    )
    .bind(&balance.id)
    .bind(&balance.user_id)
    .bind(&balance.leave_type_id)
    .bind(balance.year)
    .bind(balance.allocated_days)
    .bind(balance.used_days)
    .bind(balance.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl LeaveStore for PgStore {
    async fn list_leave_types(&self, include_inactive: bool) -> RepoResult<Vec<LeaveType>> {
        Ok(
            sqlx::query_as("SELECT * FROM leave_types WHERE is_active OR $1 ORDER BY name")
                .bind(include_inactive)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_leave_type(&self, id: &str) -> RepoResult<Option<LeaveType>> {
        Ok(sqlx::query_as("SELECT * FROM leave_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO leave_types (id, name, description, max_days_per_year, carry_forward, \
             is_active, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&leave_type.id)
        .bind(&leave_type.name)
        .bind(&leave_type.description)
        .bind(leave_type.max_days_per_year)
        .bind(leave_type.carry_forward)
        .bind(leave_type.is_active)
        .bind(leave_type.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_leave_type(&self, leave_type: &LeaveType) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE leave_types SET name = $1, description = $2, max_days_per_year = $3, \
             carry_forward = $4, is_active = $5 WHERE id = $6",
        )
        .bind(&leave_type.name)
        .bind(&leave_type.description)
        .bind(leave_type.max_days_per_year)
        .bind(leave_type.carry_forward)
        .bind(leave_type.is_active)
        .bind(&leave_type.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(LeaveError::LeaveTypeNotFound.into());
        }
        Ok(())
    }

    async fn create_leave_request(&self, request: &LeaveRequest) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO leave_requests (id, user_id, leave_type_id, start_date, end_date, \
             days_requested, reason, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(&request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days_requested)
        .bind(&request.reason)
        .bind(request.status.as_db())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_leave_request(&self, id: &str) -> RepoResult<Option<LeaveRequest>> {
        let row: Option<LeaveRequestRow> =
            sqlx::query_as("SELECT * FROM leave_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn update_pending_leave_request(
        &self,
        request: &LeaveRequest,
    ) -> RepoResult<LeaveRequest> {
        let row: Option<LeaveRequestRow> = sqlx::query_as(
            "UPDATE leave_requests SET leave_type_id = $1, start_date = $2, end_date = $3, \
             days_requested = $4, reason = $5, updated_at = $6 \
             WHERE id = $7 AND status = 'PENDING' RETURNING *",
        )
        .bind(&request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days_requested)
        .bind(&request.reason)
        .bind(request.updated_at)
        .bind(&request.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let current = self
                    .find_leave_request(&request.id)
                    .await?
                    .ok_or(LeaveError::RequestNotFound)?;
                Err(LeaveError::NotPending(current.status).into())
            }
        }
    }

    async fn transition_leave_request(
        &self,
        id: &str,
        transition: &LeaveTransition,
        now_ms: i64,
    ) -> RepoResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let row: Option<LeaveRequestRow> =
            sqlx::query_as("SELECT * FROM leave_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = LeaveRequest::try_from(row.ok_or(LeaveError::RequestNotFound)?)?;
        let next = lifecycle::apply(&current, transition, now_ms)?;

        if let LeaveTransition::Approve {
            enforce_balance: true,
            ..
        } = transition
        {
            let year = current.start_date.year();
            let balance = lock_or_open_balance(&mut tx, &current, year, now_ms).await?;
            let debited = ledger::debit(&balance, current.days_requested, now_ms)?;
            sqlx::query("UPDATE leave_balances SET used_days = $1, updated_at = $2 WHERE id = $3")
                .bind(debited.used_days)
                .bind(debited.updated_at)
                .bind(&debited.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE leave_requests SET status = $1, approved_by = $2, approved_at = $3, \
             comments = $4, updated_at = $5 WHERE id = $6",
        )
        .bind(next.status.as_db())
        .bind(&next.approved_by)
        .bind(next.approved_at)
        .bind(&next.comments)
        .bind(next.updated_at)
        .bind(&next.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(next)
    }

    async fn delete_leave_request(&self, id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<LeaveRequest>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM leave_requests");
        push_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new("SELECT * FROM leave_requests");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<LeaveRequestRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(PaginatedResponse::new(
            collect(rows)?,
            total as u64,
            page.page(),
            page.limit(),
        ))
    }

    async fn find_leave_requests(
        &self,
        filter: &LeaveRequestFilter,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let mut qb = QueryBuilder::new("SELECT * FROM leave_requests");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id");
        let rows: Vec<LeaveRequestRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn list_leave_balances(
        &self,
        user_id: Option<&str>,
        year: i32,
    ) -> RepoResult<Vec<LeaveBalance>> {
        Ok(sqlx::query_as(
            "SELECT id, user_id, leave_type_id, year, allocated_days, used_days, updated_at \
             FROM leave_balances WHERE year = $1 AND ($2::TEXT IS NULL OR user_id = $2) \
             ORDER BY user_id, leave_type_id",
        )
        .bind(year)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_leave_allocation(
        &self,
        user_id: &str,
        leave_type_id: &str,
        year: i32,
        allocated_days: i32,
        now_ms: i64,
    ) -> RepoResult<LeaveBalance> {
        let mut tx = self.pool.begin().await?;

        // Open first so the row lock below always exists
        let fresh = LeaveBalance {
            id: new_id(),
            user_id: user_id.to_string(),
            leave_type_id: leave_type_id.to_string(),
            year,
            allocated_days,
            used_days: 0,
            updated_at: now_ms,
        };
        insert_balance_if_absent(&mut tx, &fresh).await?;
        let current = lock_balance(&mut tx, user_id, leave_type_id, year)
            .await?
            .ok_or_else(|| {
                RepoError::Database("leave balance vanished after insert".to_string())
            })?;
        let next = ledger::reallocate(&current, allocated_days, now_ms)?;

        let stored: LeaveBalance = sqlx::query_as(
            "UPDATE leave_balances SET allocated_days = $1, updated_at = $2 WHERE id = $3 \
             RETURNING id, user_id, leave_type_id, year, allocated_days, used_days, updated_at",
        )
        .bind(next.allocated_days)
        .bind(next.updated_at)
        .bind(&next.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }
}
