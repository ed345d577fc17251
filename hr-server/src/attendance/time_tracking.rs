//! Free-form time entries, scoped to their owner

use shared::models::TimeEntry;
use shared::util::new_id;
use shared::{AppError, AppResult, ErrorCode};

use crate::db::{Store, TimeEntryFilter};

#[derive(Debug, Clone)]
pub struct TimeEntryInput {
    pub project_name: Option<String>,
    pub task_description: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub billable: bool,
}

impl TimeEntryInput {
    fn check_range(&self) -> AppResult<()> {
        if self.end_time.is_some_and(|end| end < self.start_time) {
            return Err(AppError::new(ErrorCode::InvalidTimeRange));
        }
        Ok(())
    }
}

/// Entry owned by `user_id`; someone else's entry reads as not found
pub async fn find_owned(store: &dyn Store, user_id: &str, id: &str) -> AppResult<TimeEntry> {
    store
        .find_time_entry(id)
        .await?
        .filter(|e| e.user_id == user_id)
        .ok_or_else(|| AppError::new(ErrorCode::TimeEntryNotFound))
}

pub async fn create(
    store: &dyn Store,
    user_id: &str,
    input: TimeEntryInput,
    now_ms: i64,
) -> AppResult<TimeEntry> {
    input.check_range()?;
    let entry = TimeEntry {
        id: new_id(),
        user_id: user_id.to_string(),
        project_name: input.project_name,
        task_description: input.task_description,
        start_time: input.start_time,
        end_time: input.end_time,
        billable: input.billable,
        created_at: now_ms,
        updated_at: now_ms,
    };
    store.create_time_entry(&entry).await?;
    Ok(entry)
}

pub async fn update(
    store: &dyn Store,
    user_id: &str,
    id: &str,
    input: TimeEntryInput,
    now_ms: i64,
) -> AppResult<TimeEntry> {
    input.check_range()?;
    let mut entry = find_owned(store, user_id, id).await?;
    entry.project_name = input.project_name;
    entry.task_description = input.task_description;
    entry.start_time = input.start_time;
    entry.end_time = input.end_time;
    entry.billable = input.billable;
    entry.updated_at = now_ms;
    store.update_time_entry(&entry).await?;
    Ok(entry)
}

pub async fn delete(store: &dyn Store, user_id: &str, id: &str) -> AppResult<()> {
    find_owned(store, user_id, id).await?;
    if !store.delete_time_entry(id).await? {
        return Err(AppError::new(ErrorCode::TimeEntryNotFound));
    }
    Ok(())
}

pub async fn list(
    store: &dyn Store,
    user_id: &str,
    from: Option<i64>,
    until: Option<i64>,
) -> AppResult<Vec<TimeEntry>> {
    Ok(store
        .list_time_entries(&TimeEntryFilter {
            user_id: user_id.to_string(),
            from,
            until,
        })
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn input(start: i64, end: Option<i64>) -> TimeEntryInput {
        TimeEntryInput {
            project_name: Some("Payroll".into()),
            task_description: "Reconcile March".into(),
            start_time: start,
            end_time: end,
            billable: true,
        }
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let store = MemoryStore::new();
        let err = create(&store, "u1", input(10_000, Some(5_000)), 0)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTimeRange);
        // Open entries and zero-length entries are fine
        assert!(create(&store, "u1", input(10_000, None), 0).await.is_ok());
        assert!(create(&store, "u1", input(10_000, Some(10_000)), 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_entries_scoped_to_owner() {
        let store = MemoryStore::new();
        let entry = create(&store, "u1", input(0, Some(3_600_000)), 0).await.unwrap();

        let err = find_owned(&store, "u2", &entry.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TimeEntryNotFound);
        assert!(delete(&store, "u2", &entry.id).await.is_err());
        assert!(list(&store, "u2", None, None).await.unwrap().is_empty());

        let updated = update(&store, "u1", &entry.id, input(0, Some(7_200_000)), 5)
            .await
            .unwrap();
        assert_eq!(updated.hours(), Some(2.0));
        assert_eq!(list(&store, "u1", None, None).await.unwrap().len(), 1);

        delete(&store, "u1", &entry.id).await.unwrap();
        assert!(list(&store, "u1", None, None).await.unwrap().is_empty());
    }
}
