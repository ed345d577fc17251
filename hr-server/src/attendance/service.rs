//! Attendance operations over the store
//!
//! Clock-in is a single atomic store call. The other transitions read the
//! day's row, run the pure machine and write back with compare-and-swap; a
//! lost race is retried once against the fresh row.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::models::{Attendance, AttendanceSummary};
use shared::util::new_id;
use shared::{AppError, AppResult, ErrorCode};

use super::machine::{self, AttendanceError};
use super::summary;
use crate::db::{AttendanceFilter, Store};
use crate::utils::time::{business_date, month_bounds};

const CAS_ATTEMPTS: usize = 2;

pub async fn clock_in(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
    notes: Option<String>,
) -> AppResult<Attendance> {
    let date = business_date(now, tz);
    let record = store
        .clock_in(new_id(), user_id, date, now.timestamp_millis(), notes)
        .await?;
    tracing::info!(user_id = %user_id, date = %date, "Clocked in");
    Ok(record)
}

pub async fn clock_out(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<Attendance> {
    let record = mutate(store, user_id, business_date(now, tz), |r| {
        machine::clock_out(Some(r), now.timestamp_millis())
    })
    .await?;
    tracing::info!(user_id = %user_id, total_hours = ?record.total_hours, "Clocked out");
    Ok(record)
}

pub async fn start_break(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<Attendance> {
    mutate(store, user_id, business_date(now, tz), |r| {
        machine::start_break(Some(r), now.timestamp_millis())
    })
    .await
}

pub async fn end_break(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<Attendance> {
    mutate(store, user_id, business_date(now, tz), |r| {
        machine::end_break(Some(r), now.timestamp_millis())
    })
    .await
}

/// Today's row for a user, if any
pub async fn today(
    store: &dyn Store,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<Option<Attendance>> {
    Ok(store
        .find_attendance(user_id, business_date(now, tz))
        .await?)
}

pub async fn monthly_summary(
    store: &dyn Store,
    user_id: &str,
    year: i32,
    month: u32,
) -> AppResult<AttendanceSummary> {
    let (first, last) = month_bounds(year, month)?;
    let records = store
        .find_attendance_range(&AttendanceFilter {
            user_id: Some(user_id.to_string()),
            start_date: Some(first),
            end_date: Some(last),
            ..Default::default()
        })
        .await?;
    Ok(summary::summarize(year, month, &records))
}

async fn mutate<F>(
    store: &dyn Store,
    user_id: &str,
    date: NaiveDate,
    transition: F,
) -> AppResult<Attendance>
where
    F: Fn(&Attendance) -> Result<Attendance, AttendanceError> + Send + Sync,
{
    for attempt in 1..=CAS_ATTEMPTS {
        let current = store
            .find_attendance(user_id, date)
            .await?
            .ok_or(AttendanceError::NoClockInRecord)?;
        let next = transition(&current)?;
        if store.replace_attendance(&current, &next).await? {
            return Ok(next);
        }
        tracing::debug!(user_id = %user_id, attempt, "Attendance row changed concurrently");
    }
    Err(AppError::new(ErrorCode::AttendanceConflict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn test_clock_day() {
        let store = MemoryStore::new();
        let tz = Tz::UTC;

        clock_in(&store, "u1", at(9, 0), tz, None).await.unwrap();
        let err = clock_in(&store, "u1", at(9, 5), tz, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyClockedIn);

        start_break(&store, "u1", at(12, 0), tz).await.unwrap();
        end_break(&store, "u1", at(12, 30), tz).await.unwrap();
        let out = clock_out(&store, "u1", at(17, 30), tz).await.unwrap();
        assert_eq!(out.break_duration, 30);
        assert_eq!(out.total_hours, Some(8.0));

        let err = clock_out(&store, "u1", at(18, 0), tz).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyClockedOut);
    }

    #[tokio::test]
    async fn test_clock_out_without_clock_in() {
        let store = MemoryStore::new();
        let err = clock_out(&store, "u1", at(17, 0), Tz::UTC)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoClockInRecord);
    }

    #[tokio::test]
    async fn test_day_bucketed_in_business_timezone() {
        let store = MemoryStore::new();
        // 23:30 UTC on June 2nd is already June 3rd in Tokyo
        let rec = clock_in(&store, "u1", at(23, 30), chrono_tz::Asia::Tokyo, None)
            .await
            .unwrap();
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_clock_in_single_winner() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                clock_in(store.as_ref(), "u1", at(9, 0), Tz::UTC, None).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e.code, ErrorCode::AlreadyClockedIn),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_empty_month_summary() {
        let store = MemoryStore::new();
        let summary = monthly_summary(&store, "u1", 2025, 2).await.unwrap();
        assert_eq!(summary.total_days, 0);
        assert_eq!(summary.attendance_rate, 0.0);
    }
}
