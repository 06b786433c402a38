// Sort keys and the priority-rank comparator

use crate::models::Task;

/// Field a list query may sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Duedate,
    Description,
    Priority,
    Status,
}

impl SortKey {
    /// Parse a caller-supplied key, case-insensitively. Unknown keys are
    /// `None`, which callers treat as "no sort requested".
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "title" => Some(SortKey::Title),
            "duedate" => Some(SortKey::Duedate),
            "description" => Some(SortKey::Description),
            "priority" => Some(SortKey::Priority),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Duedate => "duedate",
            SortKey::Description => "description",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
        }
    }

    /// Direction for field-native sorting. Every key sorts ascending except
    /// `status`, which sorts descending. Unusual, but the policy is load
    /// bearing for existing clients and must not change.
    pub fn direction(self) -> SortDirection {
        match self {
            SortKey::Status => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Reorder tasks by priority rank: High, then Medium, then Low, then any
/// unrecognized priority. The sort is stable, so tasks sharing a rank keep
/// their store-native relative order.
///
/// This runs in memory, after the bulk read, and only when the requested
/// sort key is `priority`; the store's field-native sort is skipped in
/// that case because lexical ordering of the priority strings would be
/// wrong ("High" < "Low" < "Medium").
pub fn by_priority_rank(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.priority.rank());
}
