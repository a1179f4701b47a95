//! SQLite-backed task accessor.
//!
//! One connection per unit of work: `TaskStore::run` opens a connection on the
//! blocking pool, hands it to the caller, and drops it when the closure
//! returns, whether it succeeded or not.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::task::Task;
use super::{StoreError, StoreResult};

/// How long a writer waits on SQLite's file lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        done INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );";

/// Handle to the task database. Cheap to clone; holds no open connection.
#[derive(Debug, Clone)]
pub struct TaskStore {
    db_path: Arc<PathBuf>,
}

impl TaskStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh connection, creating the parent directory if needed.
    pub fn open_connection(&self) -> StoreResult<StoreConnection> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(self.db_path.as_path()).map_err(|source| StoreError::Open {
            path: self.db_path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(StoreConnection { conn })
    }

    /// Create the `tasks` table if it does not exist yet.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        let conn = self.open_connection()?;
        conn.ensure_schema()?;
        tracing::info!(db_path = %self.db_path.display(), "Task schema ready");
        Ok(())
    }

    /// Run `f` against a per-call connection on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&StoreConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.open_connection()?;
            f(&conn)
        })
        .await?
    }
}

/// An open connection scoped to a single request.
pub struct StoreConnection {
    conn: Connection,
}

impl StoreConnection {
    pub fn ensure_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Trivial liveness query.
    pub fn ping(&self) -> StoreResult<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn insert_task(&self, title: &str) -> StoreResult<Task> {
        self.conn.execute(
            "INSERT INTO tasks (title, done, created_at) VALUES (?1, 0, datetime('now'))",
            params![title],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn get_task(&self, id: i64) -> StoreResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, done, created_at FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// All tasks, newest first.
    pub fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, done, created_at FROM tasks ORDER BY id DESC")?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Set `done = 1`. Repeating on a finished task is a no-op that still
    /// returns the row.
    pub fn mark_done(&self, id: i64) -> StoreResult<Task> {
        let changed = self
            .conn
            .execute("UPDATE tasks SET done = 1 WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.get_task(id)?.ok_or(StoreError::NotFound(id))
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        done: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, TaskStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("nested").join("app.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    #[test]
    fn ensure_schema_creates_directory_and_is_idempotent() {
        let (dir, store) = store();
        assert!(dir.path().join("nested").is_dir());
        store.ensure_schema().unwrap();
        store.open_connection().unwrap().ping().unwrap();
    }

    #[test]
    fn ensure_schema_fails_when_location_is_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = TaskStore::new(blocker.join("app.db"));
        let err = store.ensure_schema().unwrap_err();
        assert!(matches!(err, StoreError::CreateDir { .. }), "got {err:?}");
    }

    #[test]
    fn insert_returns_populated_pending_task() {
        let (_dir, store) = store();
        let conn = store.open_connection().unwrap();

        let task = conn.insert_task("write report").unwrap();
        assert!(task.id > 0);
        assert_eq!(task.title, "write report");
        assert!(!task.done);
        // datetime('now') format: YYYY-MM-DD HH:MM:SS
        assert_eq!(task.created_at.len(), 19);
    }

    #[test]
    fn list_is_newest_first() {
        let (_dir, store) = store();
        let conn = store.open_connection().unwrap();
        let ids: Vec<i64> = (0..5)
            .map(|i| conn.insert_task(&format!("task {i}")).unwrap().id)
            .collect();

        let listed: Vec<i64> = conn.list_tasks().unwrap().iter().map(|t| t.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(listed, expected);
    }

    #[test]
    fn mark_done_is_idempotent_and_reports_missing_rows() {
        let (_dir, store) = store();
        let conn = store.open_connection().unwrap();
        let task = conn.insert_task("ship it").unwrap();

        let first = conn.mark_done(task.id).unwrap();
        assert!(first.done);
        let second = conn.mark_done(task.id).unwrap();
        assert!(second.done);
        assert_eq!(first.created_at, second.created_at);

        let err = conn.mark_done(999_999).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(999_999)));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        // No delete is exposed, but AUTOINCREMENT must still hold if rows vanish.
        let (_dir, store) = store();
        let conn = store.open_connection().unwrap();
        let first = conn.insert_task("a").unwrap();
        conn.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![first.id])
            .unwrap();
        let second = conn.insert_task("b").unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn run_executes_on_fresh_connection() {
        let (_dir, store) = store();
        let task = store
            .run(|conn| conn.insert_task("from blocking pool"))
            .await
            .unwrap();
        let listed = store.run(|conn| conn.list_tasks()).await.unwrap();
        assert_eq!(listed, vec![task]);
    }
}
