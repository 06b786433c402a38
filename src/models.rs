// Data models for the task ledger

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default status applied when a task is created without one.
pub const DEFAULT_STATUS: &str = "To-Do";

/// Minimum trimmed length for title and description.
const MIN_TEXT_LEN: usize = 5;

/// A unit of trackable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier; never changes after creation.
    pub id: String,
    pub title: String,
    pub duedate: DateTime<Utc>,
    pub description: String,
    pub priority: Priority,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Priority rank. The three recognized ranks order High < Medium < Low for
/// priority sorting; anything else is preserved verbatim and ranks last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Priority {
    /// Fixed rank used only by the priority sorter: High 1, Medium 2, Low 3.
    /// Unrecognized values rank 4, so they sort after Low.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Unrecognized(_) => 4,
        }
    }

    /// The literal stored string, exactly as the client supplied it.
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Unrecognized(s) => s,
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            _ => Priority::Unrecognized(s),
        }
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for a create mutation. Status is not accepted here; it defaults
/// to [`DEFAULT_STATUS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub duedate: DateTime<Utc>,
    pub description: String,
    pub priority: Priority,
}

impl TaskDraft {
    /// Reject malformed input before any store write happens.
    pub fn validate(&self) -> Result<()> {
        validate_text("title", &self.title)?;
        validate_text("description", &self.description)
    }
}

/// Input for an edit mutation: all five mutable fields are replaced
/// wholesale, regardless of which ones the caller meant to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub duedate: DateTime<Utc>,
    pub priority: Priority,
    pub status: String,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_text("title", &self.title)?;
        validate_text("description", &self.description)
    }
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().len() < MIN_TEXT_LEN {
        return Err(Error::Validation(format!(
            "{} must be at least {} characters",
            field, MIN_TEXT_LEN
        )));
    }
    Ok(())
}

/// Render a due date the way the store persists it: fixed-width RFC 3339
/// with millisecond precision, so lexicographic order is chronological.
pub fn format_duedate(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current timestamp in milliseconds since the epoch.
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch")
        .as_millis() as i64
}
