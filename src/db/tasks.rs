//! Task CRUD and tag association operations.

use super::{Database, ms_to_datetime, now_ms};
use crate::types::{NewTask, Priority, Status, Task, TaskFilter, TaskPatch};
use crate::validation::ValidationError;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};
use std::collections::HashSet;
use tracing::debug;

const TASK_COLUMNS: &str =
    "id, title, description, priority, status, due_date, project_id, position, parent_id, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;
    let due_date: Option<i64> = row.get("due_date")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        // CHECK constraints keep both columns inside the closed sets
        priority: Priority::parse(&priority).unwrap_or_default(),
        status: Status::parse(&status).unwrap_or_default(),
        due_date: due_date.map(ms_to_datetime),
        project_id: row.get("project_id")?,
        position: row.get("position")?,
        parent_id: row.get("parent_id")?,
        created_at: ms_to_datetime(created_at),
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Junction table helpers for tag management
// =============================================================================

/// Associate tags with a task. Pairs that already exist are skipped.
///
/// An unknown tag id fails the foreign key and surfaces as a `tagIds`
/// validation error; the caller's transaction is rolled back.
fn insert_task_tags(conn: &Connection, task_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)")?;
    for (i, tag_id) in tag_ids.iter().enumerate() {
        if let Err(e) = stmt.execute(params![task_id, tag_id]) {
            if is_foreign_key_violation(&e) {
                return Err(ValidationError {
                    message: format!("Unknown tag id {}", tag_id),
                    field: Some(format!("tagIds.{}", i)),
                }
                .into());
            }
            return Err(e.into());
        }
    }
    Ok(())
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// Replace the full tag set of a task.
fn replace_task_tags(conn: &Connection, task_id: i64, tag_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
    insert_task_tags(conn, task_id, tag_ids)
}

/// Whether making `parent_id` the parent of `task_id` would close a cycle.
fn would_create_cycle(conn: &Connection, task_id: i64, parent_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT parent_id FROM tasks WHERE id = ?1")?;
    let mut seen = HashSet::new();
    let mut current = Some(parent_id);

    while let Some(id) = current {
        if id == task_id {
            return Ok(true);
        }
        if !seen.insert(id) {
            // A pre-existing loop above us that does not include task_id
            return Ok(false);
        }
        current = match stmt.query_row(params![id], |row| row.get::<_, Option<i64>>(0)) {
            Ok(parent) => parent,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
    }

    Ok(false)
}

/// Case-insensitive substring match that folds non-ASCII letters too.
fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

impl Database {
    /// List tasks matching every supplied filter field, newest first.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM tasks WHERE 1=1", TASK_COLUMNS);
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(project_id) = filter.project_id {
                params_vec.push(Box::new(project_id));
                sql.push_str(&format!(" AND project_id = ?{}", params_vec.len()));
            }

            if let Some(status) = filter.status {
                params_vec.push(Box::new(status.as_str()));
                sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
            }

            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;

            // SQLite LIKE only folds ASCII, so the title search runs here
            let tasks = match filter.search.as_deref().filter(|s| !s.is_empty()) {
                Some(search) => {
                    let needle = search.to_lowercase();
                    tasks
                        .into_iter()
                        .filter(|task| title_matches(&task.title, &needle))
                        .collect()
                }
                None => tasks,
            };

            Ok(tasks)
        })
    }

    /// Get a task by ID. `None` means not found.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Count all tasks.
    pub fn count_tasks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Create a task, then associate it with `tag_ids` if any are given.
    ///
    /// Tag existence is not checked up front; an unknown tag id fails the
    /// foreign key and rolls the whole creation back with a validation error.
    pub fn create_task(&self, task: &NewTask, tag_ids: Option<&[i64]>) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tasks (
                    title, description, priority, status, due_date,
                    project_id, position, parent_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    task.title,
                    task.description,
                    task.priority.as_str(),
                    task.status.as_str(),
                    task.due_date.map(|d| d.timestamp_millis()),
                    task.project_id,
                    task.position,
                    task.parent_id,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            if let Some(tag_ids) = tag_ids.filter(|ids| !ids.is_empty()) {
                insert_task_tags(&tx, id, tag_ids)?;
            }

            let created = get_task_internal(&tx, id)?
                .ok_or_else(|| anyhow!("task {} vanished after insert", id))?;

            tx.commit()?;
            debug!(task_id = id, "Created task");

            Ok(created)
        })
    }

    /// Apply a partial update to a task.
    ///
    /// Only fields present in `patch` change. When `tag_ids` is `Some`, the
    /// task's tag set is replaced by it (an empty slice clears all tags);
    /// when `None`, associations are left untouched.
    ///
    /// Returns `None` if the task does not exist.
    pub fn update_task(
        &self,
        task_id: i64,
        patch: &TaskPatch,
        tag_ids: Option<&[i64]>,
    ) -> Result<Option<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(task) = get_task_internal(&tx, task_id)? else {
                return Ok(None);
            };

            if let Some(Some(parent_id)) = patch.parent_id {
                if would_create_cycle(&tx, task_id, parent_id)? {
                    return Err(ValidationError {
                        message: "A task cannot be its own ancestor".to_string(),
                        field: Some("parentId".to_string()),
                    }
                    .into());
                }
            }

            let updated = patch.apply_to(&task);

            if !patch.is_empty() {
                tx.execute(
                    "UPDATE tasks SET
                        title = ?1, description = ?2, priority = ?3, status = ?4,
                        due_date = ?5, project_id = ?6, position = ?7, parent_id = ?8
                     WHERE id = ?9",
                    params![
                        updated.title,
                        updated.description,
                        updated.priority.as_str(),
                        updated.status.as_str(),
                        updated.due_date.map(|d| d.timestamp_millis()),
                        updated.project_id,
                        updated.position,
                        updated.parent_id,
                        task_id,
                    ],
                )?;
            }

            if let Some(tag_ids) = tag_ids {
                replace_task_tags(&tx, task_id, tag_ids)?;
            }

            // Re-read so the result carries stored (millisecond) precision
            let stored = get_task_internal(&tx, task_id)?;

            tx.commit()?;
            debug!(task_id, replaced_tags = tag_ids.is_some(), "Updated task");

            Ok(stored)
        })
    }

    /// Delete a task. Its tag associations go with it; a missing id is a no-op.
    pub fn delete_task(&self, task_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            debug!(task_id, deleted, "Deleted task");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_matches_folds_unicode() {
        assert!(title_matches("Éclair report", "éclair"));
        assert!(title_matches("ÜBERSICHT draft", "übersicht"));
        assert!(title_matches("50% off", "0%"));
        assert!(!title_matches("Groceries", "report"));
    }

    #[test]
    fn test_cycle_detection() {
        let db = Database::open_in_memory().unwrap();
        let root = db.create_task(&NewTask::titled("root"), None).unwrap();
        let mut child = NewTask::titled("child");
        child.parent_id = Some(root.id);
        let child = db.create_task(&child, None).unwrap();

        db.with_conn(|conn| {
            assert!(would_create_cycle(conn, root.id, child.id)?);
            assert!(would_create_cycle(conn, root.id, root.id)?);
            assert!(!would_create_cycle(conn, child.id, root.id)?);
            Ok(())
        })
        .unwrap();
    }
}
