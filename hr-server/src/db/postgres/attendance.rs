use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{Attendance, AttendanceStatus};
use shared::{PageQuery, PaginatedResponse};
use sqlx::{Postgres, QueryBuilder};

use super::{PgStore, corrupt, push_department};
use crate::attendance::AttendanceError;
use crate::db::{AttendanceFilter, AttendanceStore, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: String,
    user_id: String,
    date: NaiveDate,
    clock_in: Option<i64>,
    clock_out: Option<i64>,
    break_started_at: Option<i64>,
    break_duration: i32,
    total_hours: Option<f64>,
    status: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = RepoError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_db(&row.status)
            .ok_or_else(|| corrupt("attendance status", &row.status))?;
        Ok(Attendance {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            break_started_at: row.break_started_at,
            break_duration: row.break_duration,
            total_hours: row.total_hours,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a AttendanceFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date <= ").push_bind(end);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    push_department(qb, "user_id", &filter.department_id);
}

fn collect(rows: Vec<AttendanceRow>) -> RepoResult<Vec<Attendance>> {
    rows.into_iter().map(Attendance::try_from).collect()
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn find_attendance(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Option<Attendance>> {
        let row: Option<AttendanceRow> =
            sqlx::query_as("SELECT * FROM attendance WHERE user_id = $1 AND date = $2")
                .bind(user_id)
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Attendance::try_from).transpose()
    }

    async fn clock_in(
        &self,
        id: String,
        user_id: &str,
        date: NaiveDate,
        now_ms: i64,
        notes: Option<String>,
    ) -> RepoResult<Attendance> {
        // A conflicting row is only taken over while it has no clock-in;
        // no returned row means the day was already clocked in.
        let row: Option<AttendanceRow> = sqlx::query_as(
            r#"
            INSERT INTO attendance (id, user_id, date, clock_in, break_duration, status, notes,
                                    created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, 'PRESENT', $5, $4, $4)
            ON CONFLICT (user_id, date) DO UPDATE SET
                clock_in = EXCLUDED.clock_in,
                status = 'PRESENT',
                notes = COALESCE(EXCLUDED.notes, attendance.notes),
                updated_at = EXCLUDED.updated_at
            WHERE attendance.clock_in IS NULL
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(date)
        .bind(now_ms)
        .bind(&notes)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AttendanceError::AlreadyClockedIn.into()),
        }
    }

    async fn replace_attendance(
        &self,
        current: &Attendance,
        next: &Attendance,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance SET
                clock_in = $1, clock_out = $2, break_started_at = $3, break_duration = $4,
                total_hours = $5, status = $6, notes = $7, updated_at = $8
            WHERE id = $9
              AND clock_in IS NOT DISTINCT FROM $10
              AND clock_out IS NOT DISTINCT FROM $11
              AND break_started_at IS NOT DISTINCT FROM $12
              AND break_duration = $13
              AND updated_at = $14
            "#,
        )
        .bind(next.clock_in)
        .bind(next.clock_out)
        .bind(next.break_started_at)
        .bind(next.break_duration)
        .bind(next.total_hours)
        .bind(next.status.as_db())
        .bind(&next.notes)
        .bind(next.updated_at)
        .bind(&current.id)
        .bind(current.clock_in)
        .bind(current.clock_out)
        .bind(current.break_started_at)
        .bind(current.break_duration)
        .bind(current.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageQuery,
    ) -> RepoResult<PaginatedResponse<Attendance>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM attendance");
        push_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new("SELECT * FROM attendance");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY date DESC, user_id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<AttendanceRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(PaginatedResponse::new(
            collect(rows)?,
            total as u64,
            page.page(),
            page.limit(),
        ))
    }

    async fn find_attendance_range(
        &self,
        filter: &AttendanceFilter,
    ) -> RepoResult<Vec<Attendance>> {
        let mut qb = QueryBuilder::new("SELECT * FROM attendance");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY date DESC, user_id");
        let rows: Vec<AttendanceRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        collect(rows)
    }
}
