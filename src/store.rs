// SQLite-backed task and history stores

use rusqlite::{Connection, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::history::{HistoryAction, HistoryEvent};
use crate::models::{Task, format_duedate};
use crate::sort::SortKey;

/// Persistent store holding the current-state `tasks` table and the
/// append-only `history` ledger in one SQLite database.
///
/// Store-native order for both tables is insertion order (rowid), which is
/// stable across reads.
pub struct Store {
    base_path: PathBuf,
    db: Connection,
}

impl Store {
    /// Open or create a store in a `.taskledger` subdirectory of the
    /// given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(".taskledger");
        fs::create_dir_all(&base_path)?;

        let db_path = base_path.join("taskledger.db");
        let db = Connection::open(&db_path)?;

        let store = Self { base_path, db };
        store.create_schema()?;
        info!(path = ?store.base_path, "Opened task ledger store");
        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            -- Current task state, one row per live task
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                duedate TEXT NOT NULL,
                description TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Append-only mutation ledger. task_id is a weak reference:
            -- no foreign key, rows survive deletion of the task they name.
            CREATE TABLE IF NOT EXISTS history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                task_id TEXT NOT NULL,
                action TEXT NOT NULL,
                recorded_at INTEGER NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_task_id ON history(task_id);
            CREATE INDEX IF NOT EXISTS idx_history_action ON history(task_id, action);
            "#,
        )?;

        Ok(())
    }

    // ========================================================================
    // Task store
    // ========================================================================

    /// Insert a freshly created task.
    pub fn insert_task(&mut self, task: &Task) -> Result<()> {
        self.db.execute(
            "INSERT INTO tasks (id, title, duedate, description, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                task.id,
                task.title,
                format_duedate(&task.duedate),
                task.description,
                task.priority.as_str(),
                task.status,
                task.created_at,
                task.updated_at,
            ],
        )?;
        debug!(id = %task.id, "Inserted task");
        Ok(())
    }

    /// Fetch a task by identifier.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        let mut stmt = self.db.prepare(
            "SELECT id, title, duedate, description, priority, status, created_at, updated_at
             FROM tasks WHERE id = ?1",
        )?;

        let task = stmt.query_row([id], task_from_row).optional()?;
        task.ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Replace a task's mutable fields wholesale.
    pub fn update_task(&mut self, task: &Task) -> Result<()> {
        let changed = self.db.execute(
            "UPDATE tasks SET title = ?2, duedate = ?3, description = ?4, priority = ?5,
                              status = ?6, updated_at = ?7
             WHERE id = ?1",
            rusqlite::params![
                task.id,
                task.title,
                format_duedate(&task.duedate),
                task.description,
                task.priority.as_str(),
                task.status,
                task.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(Error::TaskNotFound(task.id.clone()));
        }
        debug!(id = %task.id, "Updated task");
        Ok(())
    }

    /// Physically erase a task. The history ledger keeps the fact of its
    /// prior existence by identifier only.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let changed = self.db.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        debug!(id, "Deleted task");
        Ok(())
    }

    /// List tasks.
    ///
    /// With no sort key the result is store-native (insertion) order. With a
    /// key, the field's natural ordering applies: ascending for every key
    /// except `status`, which sorts descending per [`SortKey::direction`].
    /// No priority-rank semantics here; that pass belongs to the caller.
    pub fn list_tasks(&self, sort: Option<SortKey>) -> Result<Vec<Task>> {
        let query = match sort {
            None => "SELECT id, title, duedate, description, priority, status, created_at, updated_at
                     FROM tasks ORDER BY rowid"
                .to_string(),
            Some(key) => format!(
                "SELECT id, title, duedate, description, priority, status, created_at, updated_at
                 FROM tasks ORDER BY {} {}, rowid",
                key.column(),
                key.direction().to_sql()
            ),
        };

        let mut stmt = self.db.prepare(&query)?;
        let rows = stmt.query_map([], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Number of live tasks.
    pub fn count_tasks(&self) -> Result<u64> {
        let count: i64 = self.db.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ========================================================================
    // History store
    // ========================================================================

    /// Append one event to the ledger. Events are never updated or deleted
    /// once written; ordering is the store's insertion sequence.
    pub fn append_event(&mut self, event: &HistoryEvent) -> Result<()> {
        let event_json = serde_json::to_string(&event.action)?;

        self.db.execute(
            "INSERT INTO history (id, task_id, action, recorded_at, event_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                event.id,
                event.task_id,
                event.action.kind(),
                event.recorded_at,
                event_json,
            ],
        )?;
        debug!(task_id = %event.task_id, action = event.action.kind(), "Appended history event");
        Ok(())
    }

    /// Full ledger in insertion order.
    pub fn history(&self) -> Result<Vec<HistoryEvent>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, task_id, recorded_at, event_json FROM history ORDER BY seq")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, task_id, recorded_at, event_json) = row?;
            let action: HistoryAction = serde_json::from_str(&event_json)?;
            events.push(HistoryEvent {
                id,
                task_id,
                recorded_at,
                action,
            });
        }
        Ok(events)
    }

    /// Number of events in the ledger.
    pub fn count_events(&self) -> Result<u64> {
        let count: i64 = self.db.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Tasks with no `Create` event in the ledger.
    ///
    /// The task-write/history-append sequence is not transactional, so a
    /// failure between the two steps leaves a task without its audit trail.
    /// This is the detection half of the repair path.
    pub fn unaudited_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare(
            "SELECT t.id, t.title, t.duedate, t.description, t.priority, t.status, t.created_at, t.updated_at
             FROM tasks t
             WHERE NOT EXISTS (
                 SELECT 1 FROM history h WHERE h.task_id = t.id AND h.action = 'Create'
             )
             ORDER BY t.rowid",
        )?;

        let rows = stmt.query_map([], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let duedate_text: String = row.get(2)?;
    let duedate = chrono::DateTime::parse_from_rfc3339(&duedate_text)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&chrono::Utc);

    let priority: String = row.get(4)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        duedate,
        description: row.get(3)?,
        priority: priority.into(),
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
