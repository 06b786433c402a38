// Append-only audit records for task mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task};

/// The five mutable field names, in the order an edit event logs them.
pub const EDITED_FIELDS: [&str; 5] = ["title", "description", "duedate", "priority", "status"];

/// An immutable record of a single task mutation.
///
/// `task_id` is a weak back-reference: the task it names may have been
/// deleted since, and that orphaned reference is expected and valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: String,
    pub task_id: String,
    pub recorded_at: i64,
    pub action: HistoryAction,
}

/// One variant per mutation kind, so readers never have to guess whether
/// a field carries a string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryAction {
    /// A task was created. Carries the new identifier; there is no
    /// before-state and no touched-field list.
    Created {
        new_id: String,
    },
    /// A task was edited. Always logs the full five-field tuple on both
    /// sides, even when only one value actually changed.
    Edited {
        /// Fixed list, identical for every edit: [`EDITED_FIELDS`].
        fields: Vec<String>,
        before: FieldTuple,
        after: FieldTuple,
    },
    /// A task was deleted. Carries the identifier that used to exist;
    /// there is no after-state.
    Deleted {
        deleted_id: String,
    },
}

impl HistoryAction {
    /// Short label for display and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryAction::Created { .. } => "Create",
            HistoryAction::Edited { .. } => "Edit",
            HistoryAction::Deleted { .. } => "Delete",
        }
    }
}

/// Snapshot of the five mutable fields at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTuple {
    pub title: String,
    pub description: String,
    pub duedate: DateTime<Utc>,
    pub priority: Priority,
    pub status: String,
}

impl From<&Task> for FieldTuple {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            duedate: task.duedate,
            priority: task.priority.clone(),
            status: task.status.clone(),
        }
    }
}
