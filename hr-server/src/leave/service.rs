//! Leave operations over the store

use std::collections::HashMap;

use chrono::NaiveDate;
use shared::models::{LeaveBalanceView, LeaveRequest, LeaveStatus, LeaveType};
use shared::util::new_id;
use shared::{AppError, AppResult, ErrorCode};

use super::lifecycle::{self, LeaveTransition};
use crate::db::{RepoError, Store};

/// Fields of a new or edited leave request
#[derive(Debug, Clone)]
pub struct LeaveRequestInput {
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Leave type fields
#[derive(Debug, Clone)]
pub struct LeaveTypeInput {
    pub name: String,
    pub description: Option<String>,
    pub max_days_per_year: i32,
    pub carry_forward: bool,
    pub is_active: bool,
}

async fn active_leave_type(store: &dyn Store, id: &str) -> AppResult<LeaveType> {
    let leave_type = store
        .find_leave_type(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveTypeNotFound))?;
    if !leave_type.is_active {
        return Err(AppError::new(ErrorCode::LeaveTypeInactive));
    }
    Ok(leave_type)
}

pub async fn find_request(store: &dyn Store, id: &str) -> AppResult<LeaveRequest> {
    store
        .find_leave_request(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveRequestNotFound))
}

/// New PENDING request; balance is only checked at approval
pub async fn create_request(
    store: &dyn Store,
    user_id: &str,
    input: LeaveRequestInput,
    now_ms: i64,
) -> AppResult<LeaveRequest> {
    active_leave_type(store, &input.leave_type_id).await?;
    let days_requested = lifecycle::days_requested(input.start_date, input.end_date)?;

    let request = LeaveRequest {
        id: new_id(),
        user_id: user_id.to_string(),
        leave_type_id: input.leave_type_id,
        start_date: input.start_date,
        end_date: input.end_date,
        days_requested,
        reason: input.reason,
        status: LeaveStatus::Pending,
        approved_by: None,
        approved_at: None,
        comments: None,
        created_at: now_ms,
        updated_at: now_ms,
    };
    store.create_leave_request(&request).await?;
    tracing::info!(
        request_id = %request.id,
        user_id = %user_id,
        days = days_requested,
        "Leave request created"
    );
    Ok(request)
}

/// Owner edit of a pending request; recomputes the day count
pub async fn update_request(
    store: &dyn Store,
    caller_id: &str,
    id: &str,
    input: LeaveRequestInput,
    now_ms: i64,
) -> AppResult<LeaveRequest> {
    let current = find_request(store, id).await?;
    if current.user_id != caller_id {
        return Err(AppError::permission_denied(
            "Only the requester can edit a leave request",
        ));
    }
    lifecycle::ensure_pending(&current)?;
    if input.leave_type_id != current.leave_type_id {
        active_leave_type(store, &input.leave_type_id).await?;
    }

    let mut next = current;
    next.days_requested = lifecycle::days_requested(input.start_date, input.end_date)?;
    next.leave_type_id = input.leave_type_id;
    next.start_date = input.start_date;
    next.end_date = input.end_date;
    next.reason = input.reason;
    next.updated_at = now_ms;
    Ok(store.update_pending_leave_request(&next).await?)
}

pub async fn approve(
    store: &dyn Store,
    approver_id: &str,
    id: &str,
    enforce_balance: bool,
    now_ms: i64,
) -> AppResult<LeaveRequest> {
    let transition = LeaveTransition::Approve {
        approver_id: approver_id.to_string(),
        enforce_balance,
    };
    let request = store.transition_leave_request(id, &transition, now_ms).await?;
    tracing::info!(request_id = %id, approver_id = %approver_id, "Leave request approved");
    Ok(request)
}

pub async fn reject(
    store: &dyn Store,
    id: &str,
    comments: Option<String>,
    now_ms: i64,
) -> AppResult<LeaveRequest> {
    let request = store
        .transition_leave_request(id, &LeaveTransition::Reject { comments }, now_ms)
        .await?;
    tracing::info!(request_id = %id, "Leave request rejected");
    Ok(request)
}

/// Requester withdraws a pending request
pub async fn cancel(
    store: &dyn Store,
    caller_id: &str,
    id: &str,
    now_ms: i64,
) -> AppResult<LeaveRequest> {
    let current = find_request(store, id).await?;
    if current.user_id != caller_id {
        return Err(AppError::permission_denied(
            "Only the requester can cancel a leave request",
        ));
    }
    Ok(store
        .transition_leave_request(id, &LeaveTransition::Cancel, now_ms)
        .await?)
}

pub async fn delete_request(store: &dyn Store, id: &str) -> AppResult<()> {
    if !store.delete_leave_request(id).await? {
        return Err(AppError::new(ErrorCode::LeaveRequestNotFound));
    }
    Ok(())
}

/// Balances of `year` with their leave type names
pub async fn balances(
    store: &dyn Store,
    user_id: Option<&str>,
    year: i32,
) -> AppResult<Vec<LeaveBalanceView>> {
    let names: HashMap<String, String> = store
        .list_leave_types(true)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();
    let balances = store.list_leave_balances(user_id, year).await?;
    Ok(balances
        .iter()
        .map(|b| {
            let name = names.get(&b.leave_type_id).cloned().unwrap_or_default();
            LeaveBalanceView::new(b, name)
        })
        .collect())
}

pub async fn set_allocation(
    store: &dyn Store,
    user_id: &str,
    leave_type_id: &str,
    year: i32,
    allocated_days: i32,
    now_ms: i64,
) -> AppResult<LeaveBalanceView> {
    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::EmployeeNotFound));
    }
    let leave_type = store
        .find_leave_type(leave_type_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveTypeNotFound))?;
    let balance = store
        .set_leave_allocation(user_id, leave_type_id, year, allocated_days, now_ms)
        .await?;
    tracing::info!(
        user_id = %user_id,
        leave_type_id = %leave_type_id,
        year,
        allocated_days,
        "Leave allocation set"
    );
    Ok(LeaveBalanceView::new(&balance, leave_type.name))
}

fn name_taken(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::LeaveTypeNameExists),
        other => other.into(),
    }
}

pub async fn create_leave_type(
    store: &dyn Store,
    input: LeaveTypeInput,
    now_ms: i64,
) -> AppResult<LeaveType> {
    let leave_type = LeaveType {
        id: new_id(),
        name: input.name,
        description: input.description,
        max_days_per_year: input.max_days_per_year,
        carry_forward: input.carry_forward,
        is_active: input.is_active,
        created_at: now_ms,
    };
    store
        .create_leave_type(&leave_type)
        .await
        .map_err(name_taken)?;
    Ok(leave_type)
}

pub async fn update_leave_type(
    store: &dyn Store,
    id: &str,
    input: LeaveTypeInput,
) -> AppResult<LeaveType> {
    let mut leave_type = store
        .find_leave_type(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveTypeNotFound))?;
    leave_type.name = input.name;
    leave_type.description = input.description;
    leave_type.max_days_per_year = input.max_days_per_year;
    leave_type.carry_forward = input.carry_forward;
    leave_type.is_active = input.is_active;
    store
        .update_leave_type(&leave_type)
        .await
        .map_err(name_taken)?;
    Ok(leave_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LeaveStore, MemoryStore, UserStore, seed};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    async fn setup() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        seed::seed_leave_types(&store, 0).await.unwrap();
        let annual = store
            .list_leave_types(false)
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.name == "Annual Leave")
            .unwrap();
        (store, annual.id)
    }

    fn input(type_id: &str, start: NaiveDate, end: NaiveDate) -> LeaveRequestInput {
        LeaveRequestInput {
            leave_type_id: type_id.to_string(),
            start_date: start,
            end_date: end,
            reason: "Family vacation abroad".into(),
        }
    }

    #[tokio::test]
    async fn test_create_computes_days() {
        let (store, annual) = setup().await;
        let req = create_request(&store, "u1", input(&annual, date(7, 7), date(7, 13)), 1)
            .await
            .unwrap();
        assert_eq!(req.days_requested, 7);
        assert_eq!(req.status, LeaveStatus::Pending);

        let err = create_request(&store, "u1", input(&annual, date(7, 13), date(7, 7)), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidLeaveRange);
    }

    #[tokio::test]
    async fn test_unknown_leave_type() {
        let (store, _) = setup().await;
        let err = create_request(&store, "u1", input("nope", date(7, 7), date(7, 7)), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveTypeNotFound);
    }

    #[tokio::test]
    async fn test_approve_debits_balance_once() {
        let (store, annual) = setup().await;
        let req = create_request(&store, "u1", input(&annual, date(7, 7), date(7, 11)), 1)
            .await
            .unwrap();

        let approved = approve(&store, "m1", &req.id, true, 2).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("m1"));

        let views = balances(&store, Some("u1"), 2025).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].used_days, 5);
        assert_eq!(views[0].remaining_days, 20);
        assert_eq!(views[0].leave_type_name, "Annual Leave");

        let err = approve(&store, "m1", &req.id, true, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveNotPending);
        let views = balances(&store, Some("u1"), 2025).await.unwrap();
        assert_eq!(views[0].used_days, 5);
    }

    #[tokio::test]
    async fn test_approve_insufficient_balance() {
        let (store, annual) = setup().await;
        store
            .create_user(&seed::demo_user_record("u1", "EMP900", "u1@example.com", "r", "x"))
            .await
            .unwrap();
        set_allocation(&store, "u1", &annual, 2025, 3, 1).await.unwrap();
        let req = create_request(&store, "u1", input(&annual, date(7, 7), date(7, 11)), 1)
            .await
            .unwrap();

        let err = approve(&store, "m1", &req.id, true, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert_eq!(
            find_request(&store, &req.id).await.unwrap().status,
            LeaveStatus::Pending
        );

        // Without enforcement the approval goes through untouched
        approve(&store, "m1", &req.id, false, 3).await.unwrap();
        let views = balances(&store, Some("u1"), 2025).await.unwrap();
        assert_eq!(views[0].used_days, 0);
    }

    #[tokio::test]
    async fn test_cancel_only_by_owner() {
        let (store, annual) = setup().await;
        let req = create_request(&store, "u1", input(&annual, date(7, 7), date(7, 7)), 1)
            .await
            .unwrap();
        let err = cancel(&store, "u2", &req.id, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let cancelled = cancel(&store, "u1", &req.id, 2).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);

        let err = reject(&store, &req.id, None, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveNotPending);
    }

    #[tokio::test]
    async fn test_update_pending_recomputes_days() {
        let (store, annual) = setup().await;
        let req = create_request(&store, "u1", input(&annual, date(7, 7), date(7, 7)), 1)
            .await
            .unwrap();
        let widened = input(&annual, date(7, 7), date(7, 9));
        let edited = update_request(&store, "u1", &req.id, widened, 2)
            .await
            .unwrap();
        assert_eq!(edited.days_requested, 3);

        reject(&store, &req.id, Some("No".into()), 3).await.unwrap();
        let narrowed = input(&annual, date(7, 7), date(7, 8));
        let err = update_request(&store, "u1", &req.id, narrowed, 4)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveNotPending);
    }

    #[tokio::test]
    async fn test_leave_type_name_unique() {
        let (store, _) = setup().await;
        let err = create_leave_type(
            &store,
            LeaveTypeInput {
                name: "Sick Leave".into(),
                description: None,
                max_days_per_year: 3,
                carry_forward: false,
                is_active: true,
            },
            1,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveTypeNameExists);
    }
}
