// Mutation recording: every task write gets exactly one ledger event

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::history::{EDITED_FIELDS, FieldTuple, HistoryAction, HistoryEvent};
use crate::models::{DEFAULT_STATUS, Task, TaskDraft, TaskUpdate, now_ms};
use crate::sort::{self, SortKey};
use crate::store::Store;
use crate::export;

/// Orchestrates task mutations against an injected [`Store`], appending
/// exactly one history event per successful mutation, sequenced strictly
/// after the task write.
///
/// The two writes are not one transaction: if the task write fails, no
/// event is appended, and if the append fails after a committed task
/// write, the caller sees [`Error::AuditAppend`] while the task change
/// stays durable. [`Tracker::unaudited_tasks`] detects creates that fell
/// into that gap.
pub struct Tracker {
    store: Store,
}

impl Tracker {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Open a tracker over a store rooted at `path`.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Store::open(path)?))
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task. Status defaults to "To-Do"; the identifier is
    /// store-assigned and immutable from here on.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;

        let now = now_ms();
        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: draft.title,
            duedate: draft.duedate,
            description: draft.description,
            priority: draft.priority,
            status: DEFAULT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_task(&task)?;
        self.record(HistoryEvent {
            id: Uuid::now_v7().to_string(),
            task_id: task.id.clone(),
            recorded_at: now,
            action: HistoryAction::Created {
                new_id: task.id.clone(),
            },
        })?;

        info!(id = %task.id, "Created task");
        Ok(task)
    }

    /// Edit a task: wholesale replacement of the five mutable fields. The
    /// event always logs the full before/after tuples, even when only one
    /// value actually changed.
    ///
    /// The before snapshot is only as fresh as this read; concurrent
    /// writers are last-write-wins.
    pub fn edit(&mut self, id: &str, update: TaskUpdate) -> Result<Task> {
        update.validate()?;

        let before = self.store.get_task(id)?;
        let task = Task {
            id: before.id.clone(),
            title: update.title,
            description: update.description,
            duedate: update.duedate,
            priority: update.priority,
            status: update.status,
            created_at: before.created_at,
            updated_at: now_ms(),
        };

        self.store.update_task(&task)?;
        self.record(HistoryEvent {
            id: Uuid::now_v7().to_string(),
            task_id: task.id.clone(),
            recorded_at: task.updated_at,
            action: HistoryAction::Edited {
                fields: EDITED_FIELDS.iter().map(|s| s.to_string()).collect(),
                before: FieldTuple::from(&before),
                after: FieldTuple::from(&task),
            },
        })?;

        info!(id = %task.id, "Edited task");
        Ok(task)
    }

    /// Delete a task. NotFound if the identifier does not resolve, with no
    /// side effects and no event appended.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.store.delete_task(id)?;
        self.record(HistoryEvent {
            id: Uuid::now_v7().to_string(),
            task_id: id.to_string(),
            recorded_at: now_ms(),
            action: HistoryAction::Deleted {
                deleted_id: id.to_string(),
            },
        })?;

        info!(id, "Deleted task");
        Ok(())
    }

    fn record(&mut self, event: HistoryEvent) -> Result<()> {
        self.store.append_event(&event).map_err(|e| {
            warn!(task_id = %event.task_id, error = %e, "History append failed after task write");
            Error::AuditAppend { source: Box::new(e) }
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// List tasks plus the total count.
    ///
    /// For the `priority` key the store's field-native sort is skipped
    /// entirely: the collection is read in native order and the fixed-rank
    /// comparator is authoritative. Every other key sorts in the store.
    pub fn list(&self, sort: Option<SortKey>) -> Result<(Vec<Task>, u64)> {
        let count = self.store.count_tasks()?;
        let tasks = match sort {
            Some(SortKey::Priority) => {
                let mut tasks = self.store.list_tasks(None)?;
                sort::by_priority_rank(&mut tasks);
                tasks
            }
            other => self.store.list_tasks(other)?,
        };
        Ok((tasks, count))
    }

    /// Full mutation ledger in store-native (insertion) order.
    pub fn events(&self) -> Result<Vec<HistoryEvent>> {
        self.store.history()
    }

    /// Render the current collection as CSV bytes, rows in store-native
    /// list order.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        let tasks = self.store.list_tasks(None)?;
        export::to_csv(&tasks)
    }

    /// Tasks whose creation never made it into the ledger.
    pub fn unaudited_tasks(&self) -> Result<Vec<Task>> {
        self.store.unaudited_tasks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn tracker() -> (TempDir, Tracker) {
        let temp = TempDir::new().unwrap();
        let tracker = Tracker::open(temp.path()).unwrap();
        (temp, tracker)
    }

    fn draft(title: &str, priority: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            duedate: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
            description: "Something worth doing".to_string(),
            priority: Priority::from(priority.to_string()),
        }
    }

    fn update_from(task: &Task) -> TaskUpdate {
        TaskUpdate {
            title: task.title.clone(),
            description: task.description.clone(),
            duedate: task.duedate,
            priority: task.priority.clone(),
            status: task.status.clone(),
        }
    }

    #[test]
    fn test_create_defaults_status_and_logs_one_event() {
        let (_temp, mut tracker) = tracker();

        let task = tracker.create(draft("Write the report", "High")).unwrap();
        assert_eq!(task.status, "To-Do");

        let events = tracker.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].task_id, task.id);
        assert_eq!(
            events[0].action,
            HistoryAction::Created { new_id: task.id.clone() }
        );
    }

    #[test]
    fn test_each_mutation_logs_exactly_one_event() {
        let (_temp, mut tracker) = tracker();

        let task = tracker.create(draft("Write the report", "High")).unwrap();
        let mut update = update_from(&task);
        update.status = "Done".to_string();
        tracker.edit(&task.id, update).unwrap();
        tracker.remove(&task.id).unwrap();

        let kinds: Vec<&str> = tracker.events().unwrap().iter().map(|e| e.action.kind()).collect();
        assert_eq!(kinds, ["Create", "Edit", "Delete"]);
    }

    #[test]
    fn test_edit_logs_full_tuple_even_for_single_field_change() {
        let (_temp, mut tracker) = tracker();

        let task = tracker.create(draft("Write the report", "Medium")).unwrap();
        let mut update = update_from(&task);
        update.status = "In Progress".to_string();
        tracker.edit(&task.id, update).unwrap();

        let events = tracker.events().unwrap();
        match &events[1].action {
            HistoryAction::Edited { fields, before, after } => {
                assert_eq!(
                    fields,
                    &["title", "description", "duedate", "priority", "status"]
                );
                assert_eq!(before.title, after.title);
                assert_eq!(before.status, "To-Do");
                assert_eq!(after.status, "In Progress");
            }
            other => panic!("expected Edited event, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_missing_task_is_not_found_with_no_event() {
        let (_temp, mut tracker) = tracker();

        let update = TaskUpdate {
            title: "A valid title".to_string(),
            description: "A valid description".to_string(),
            duedate: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap(),
            priority: Priority::Low,
            status: "To-Do".to_string(),
        };
        let err = tracker.edit("nope", update).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
        assert!(tracker.events().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_task_appends_zero_events() {
        let (_temp, mut tracker) = tracker();

        assert!(matches!(tracker.remove("nope"), Err(Error::TaskNotFound(_))));
        assert!(tracker.events().unwrap().is_empty());
    }

    #[test]
    fn test_validation_failure_has_no_side_effects() {
        let (_temp, mut tracker) = tracker();

        let err = tracker.create(draft("abc", "High")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(tracker.list(None).unwrap().1, 0);
        assert!(tracker.events().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_edit_leaves_task_unchanged_with_no_event() {
        let (_temp, mut tracker) = tracker();

        let task = tracker.create(draft("Write the report", "High")).unwrap();

        let mut update = update_from(&task);
        update.title = "abc".to_string();
        let err = tracker.edit(&task.id, update).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Only the Create event exists and the task kept its fields.
        assert_eq!(tracker.events().unwrap().len(), 1);
        let unchanged = tracker.store().get_task(&task.id).unwrap();
        assert_eq!(unchanged, task);
    }

    #[test]
    fn test_append_failure_surfaces_after_durable_task_write() {
        let (temp, mut tracker) = tracker();

        // Knock the ledger table out from under the tracker so the append
        // step fails while the task write still commits.
        let db_path = temp.path().join(".taskledger").join("taskledger.db");
        let db = rusqlite::Connection::open(&db_path).unwrap();
        db.execute_batch("DROP TABLE history").unwrap();

        let err = tracker.create(draft("Write the report", "High")).unwrap_err();
        assert!(matches!(err, Error::AuditAppend { .. }));

        // The mutation is already durable; there is no rollback.
        assert_eq!(tracker.store().count_tasks().unwrap(), 1);
    }

    #[test]
    fn test_deleted_task_keeps_its_history() {
        let (_temp, mut tracker) = tracker();

        let task = tracker.create(draft("Write the report", "Low")).unwrap();
        tracker.remove(&task.id).unwrap();

        let events = tracker.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1].action,
            HistoryAction::Deleted { deleted_id: task.id.clone() }
        );
        // The task itself is gone.
        assert_eq!(tracker.list(None).unwrap().1, 0);
    }

    #[test]
    fn test_list_priority_uses_rank_not_field_order() {
        let (_temp, mut tracker) = tracker();

        for priority in ["Low", "High", "Medium", "High"] {
            tracker.create(draft(&format!("{} priority task", priority), priority)).unwrap();
        }

        let (tasks, count) = tracker.list(Some(SortKey::Priority)).unwrap();
        assert_eq!(count, 4);
        let priorities: Vec<&str> = tasks.iter().map(|t| t.priority.as_str()).collect();
        assert_eq!(priorities, ["High", "High", "Medium", "Low"]);
        // Stable: the two High tasks keep their creation order.
        assert!(tasks[0].created_at <= tasks[1].created_at);
    }

    #[test]
    fn test_list_status_key_is_descending() {
        let (_temp, mut tracker) = tracker();

        let a = tracker.create(draft("First of the batch", "Low")).unwrap();
        let b = tracker.create(draft("Second of the batch", "Low")).unwrap();

        let mut update = update_from(&a);
        update.status = "Done".to_string();
        tracker.edit(&a.id, update).unwrap();
        let mut update = update_from(&b);
        update.status = "Blocked".to_string();
        tracker.edit(&b.id, update).unwrap();

        let (tasks, _) = tracker.list(Some(SortKey::Status)).unwrap();
        let statuses: Vec<&str> = tasks.iter().map(|t| t.status.as_str()).collect();
        assert_eq!(statuses, ["Done", "Blocked"]);
    }

    #[test]
    fn test_export_rows_follow_store_order_not_priority_order() {
        let (_temp, mut tracker) = tracker();

        tracker.create(draft("A task to export", "High")).unwrap();
        tracker.create(draft("B task to export", "Low")).unwrap();
        tracker.create(draft("C task to export", "Medium")).unwrap();

        let text = String::from_utf8(tracker.export_csv().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "TITLE,DUEDATE,DESCRIPTION,PRIORITY,STATUS");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("A task to export,"));
        assert!(lines[2].starts_with("B task to export,"));
        assert!(lines[3].starts_with("C task to export,"));
        assert!(lines[2].contains(",Low,"));
    }

    #[test]
    fn test_unrecognized_priority_is_deterministically_last() {
        let (_temp, mut tracker) = tracker();

        tracker.create(draft("Strange priority", "Urgent")).unwrap();
        tracker.create(draft("Normal priority", "Low")).unwrap();

        let (tasks, _) = tracker.list(Some(SortKey::Priority)).unwrap();
        let priorities: Vec<&str> = tasks.iter().map(|t| t.priority.as_str()).collect();
        assert_eq!(priorities, ["Low", "Urgent"]);
    }
}
