//! Per (user, day) attendance state machine
//!
//! `NOT_CLOCKED_IN -> CLOCKED_IN -> CLOCKED_OUT`, with an "on break" sub-state
//! inside `CLOCKED_IN`. Every transition is a pure function from the current
//! row (if any) to the next row; persistence and atomicity live in the store.

use chrono::NaiveDate;
use shared::models::{Attendance, AttendanceStatus};
use thiserror::Error;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Rejected attendance transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("already clocked in today")]
    AlreadyClockedIn,
    #[error("no clock-in record for today")]
    NoClockInRecord,
    #[error("already clocked out today")]
    AlreadyClockedOut,
    #[error("break already started")]
    AlreadyOnBreak,
    #[error("no break in progress")]
    NotOnBreak,
}

/// Derived state of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    NotClockedIn,
    ClockedIn { on_break: bool },
    ClockedOut,
}

impl DayState {
    pub fn of(record: Option<&Attendance>) -> Self {
        match record {
            None => Self::NotClockedIn,
            Some(r) if r.clock_in.is_none() => Self::NotClockedIn,
            Some(r) if r.clock_out.is_some() => Self::ClockedOut,
            Some(r) => Self::ClockedIn {
                on_break: r.break_started_at.is_some(),
            },
        }
    }
}

/// Fresh row for a first clock-in of the day
pub fn open_day(
    id: String,
    user_id: &str,
    date: NaiveDate,
    now_ms: i64,
    notes: Option<String>,
) -> Attendance {
    Attendance {
        id,
        user_id: user_id.to_string(),
        date,
        clock_in: Some(now_ms),
        clock_out: None,
        break_started_at: None,
        break_duration: 0,
        total_hours: None,
        status: AttendanceStatus::Present,
        notes,
        created_at: now_ms,
        updated_at: now_ms,
    }
}

/// Clock in on an existing row without a clock-in (e.g. a pre-created ABSENT day)
pub fn clock_in(
    record: &Attendance,
    now_ms: i64,
    notes: Option<String>,
) -> Result<Attendance, AttendanceError> {
    if record.clock_in.is_some() {
        return Err(AttendanceError::AlreadyClockedIn);
    }
    let mut next = record.clone();
    next.clock_in = Some(now_ms);
    next.status = AttendanceStatus::Present;
    if notes.is_some() {
        next.notes = notes;
    }
    next.updated_at = now_ms;
    Ok(next)
}

pub fn clock_out(record: Option<&Attendance>, now_ms: i64) -> Result<Attendance, AttendanceError> {
    let (record, clock_in) = require_clocked_in(record)?;
    let mut next = record.clone();
    // Clocking out closes a running break
    if let Some(started) = next.break_started_at.take() {
        next.break_duration += elapsed_minutes(started, now_ms);
    }
    next.clock_out = Some(now_ms);
    next.total_hours = Some(worked_hours(clock_in, now_ms, next.break_duration));
    next.updated_at = now_ms;
    Ok(next)
}

pub fn start_break(
    record: Option<&Attendance>,
    now_ms: i64,
) -> Result<Attendance, AttendanceError> {
    let (record, _) = require_clocked_in(record)?;
    if record.break_started_at.is_some() {
        return Err(AttendanceError::AlreadyOnBreak);
    }
    let mut next = record.clone();
    next.break_started_at = Some(now_ms);
    next.updated_at = now_ms;
    Ok(next)
}

pub fn end_break(record: Option<&Attendance>, now_ms: i64) -> Result<Attendance, AttendanceError> {
    let (record, _) = require_clocked_in(record)?;
    let Some(started) = record.break_started_at else {
        return Err(AttendanceError::NotOnBreak);
    };
    let mut next = record.clone();
    next.break_started_at = None;
    next.break_duration += elapsed_minutes(started, now_ms);
    next.updated_at = now_ms;
    Ok(next)
}

fn require_clocked_in(
    record: Option<&Attendance>,
) -> Result<(&Attendance, i64), AttendanceError> {
    let record = record.ok_or(AttendanceError::NoClockInRecord)?;
    let clock_in = record.clock_in.ok_or(AttendanceError::NoClockInRecord)?;
    if record.clock_out.is_some() {
        return Err(AttendanceError::AlreadyClockedOut);
    }
    Ok((record, clock_in))
}

/// Whole minutes between two instants, never negative
fn elapsed_minutes(from_ms: i64, to_ms: i64) -> i32 {
    ((to_ms - from_ms).max(0) / MILLIS_PER_MINUTE) as i32
}

/// `max(0, (out - in) - break)` in hours, rounded to 2 decimals
pub fn worked_hours(clock_in_ms: i64, clock_out_ms: i64, break_minutes: i32) -> f64 {
    let raw = (clock_out_ms - clock_in_ms) as f64 / MILLIS_PER_HOUR;
    let adjusted = (raw - f64::from(break_minutes) / 60.0).max(0.0);
    (adjusted * 100.0).round() / 100.0
}
