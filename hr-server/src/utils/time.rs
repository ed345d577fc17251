//! 时间工具函数 — 业务时区转换
//!
//! Attendance days are bucketed in a single configured business timezone.
//! Store layers only see `NaiveDate` days and `i64` Unix millis.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::{AppError, AppResult};

/// Calendar day of `now` in the business timezone
pub fn business_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month}")))?;
    Ok((first, last))
}

/// (year, month) of `now` in the business timezone
pub fn current_month(now: DateTime<Utc>, tz: Tz) -> (i32, u32) {
    let today = business_date(now, tz);
    (today.year(), today.month())
}

/// Inclusive date range check. Both bounds must be present to filter, as in list queries.
pub fn validate_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(AppError::validation("startDate must not be after endDate"));
    }
    Ok(())
}
