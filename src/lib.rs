// TaskLedger - task tracking with an append-only mutation ledger on SQLite

pub mod audit;
pub mod error;
pub mod export;
pub mod history;
pub mod models;
pub mod sort;
pub mod store;

// Re-export main types for convenience
pub use audit::Tracker;
pub use error::{Error, ErrorCategory, Result};
pub use history::{EDITED_FIELDS, FieldTuple, HistoryAction, HistoryEvent};
pub use models::{DEFAULT_STATUS, Priority, Task, TaskDraft, TaskUpdate, now_ms};
pub use sort::{SortDirection, SortKey};
pub use store::Store;
