//! Tag operations and task-tag lookups.

use super::{Database, is_unique_violation};
use crate::error::ApiError;
use crate::types::{NewTag, Tag, TagPatch};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use tracing::debug;

fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

fn get_tag_internal(conn: &Connection, tag_id: i64) -> Result<Option<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM tags WHERE id = ?1")?;
    match stmt.query_row(params![tag_id], parse_tag_row) {
        Ok(tag) => Ok(Some(tag)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn map_name_conflict(err: rusqlite::Error) -> anyhow::Error {
    if is_unique_violation(&err, "tags", "name") {
        ApiError::already_exists("tag", "name").into()
    } else {
        err.into()
    }
}

impl Database {
    pub fn get_tags(&self) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, color FROM tags ORDER BY id")?;
            let tags = stmt
                .query_map([], parse_tag_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }

    pub fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (name, color) VALUES (?1, ?2)",
                params![tag.name, tag.color],
            )
            .map_err(map_name_conflict)?;
            let id = conn.last_insert_rowid();
            debug!(tag_id = id, name = %tag.name, "Created tag");

            Ok(Tag {
                id,
                name: tag.name.clone(),
                color: tag.color.clone(),
            })
        })
    }

    /// Apply a partial update. Returns `None` if the tag does not exist.
    pub fn update_tag(&self, tag_id: i64, patch: &TagPatch) -> Result<Option<Tag>> {
        self.with_conn(|conn| {
            let Some(tag) = get_tag_internal(conn, tag_id)? else {
                return Ok(None);
            };

            let updated = Tag {
                id: tag.id,
                name: patch.name.clone().unwrap_or(tag.name),
                color: patch.color.clone().unwrap_or(tag.color),
            };

            conn.execute(
                "UPDATE tags SET name = ?1, color = ?2 WHERE id = ?3",
                params![updated.name, updated.color, tag_id],
            )
            .map_err(map_name_conflict)?;

            Ok(Some(updated))
        })
    }

    /// Tags currently associated with a task. Empty for unknown tasks.
    pub fn get_task_tags(&self, task_id: i64) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.name, t.color
                 FROM task_tags tt
                 INNER JOIN tags t ON tt.tag_id = t.id
                 WHERE tt.task_id = ?1
                 ORDER BY t.id",
            )?;
            let tags = stmt
                .query_map(params![task_id], parse_tag_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tags)
        })
    }
}
