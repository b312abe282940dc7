//! Project operations.

use super::{Database, is_unique_violation};
use crate::config::ProjectDeletePolicy;
use crate::error::ApiError;
use crate::types::{NewProject, Project, ProjectPatch};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        color: row.get("color")?,
    })
}

fn get_project_internal(conn: &Connection, project_id: i64) -> Result<Option<Project>> {
    let mut stmt = conn.prepare("SELECT id, name, slug, color FROM projects WHERE id = ?1")?;
    match stmt.query_row(params![project_id], parse_project_row) {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Map a duplicate slug to a conflict; pass anything else through.
fn map_slug_conflict(err: rusqlite::Error) -> anyhow::Error {
    if is_unique_violation(&err, "projects", "slug") {
        ApiError::already_exists("project", "slug").into()
    } else {
        err.into()
    }
}

impl Database {
    /// List all projects in creation order.
    pub fn get_projects(&self) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, slug, color FROM projects ORDER BY id")?;
            let projects = stmt
                .query_map([], parse_project_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(projects)
        })
    }

    pub fn get_project(&self, project_id: i64) -> Result<Option<Project>> {
        self.with_conn(|conn| get_project_internal(conn, project_id))
    }

    pub fn create_project(&self, project: &NewProject) -> Result<Project> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, slug, color) VALUES (?1, ?2, ?3)",
                params![project.name, project.slug, project.color],
            )
            .map_err(map_slug_conflict)?;
            let id = conn.last_insert_rowid();
            debug!(project_id = id, slug = %project.slug, "Created project");

            Ok(Project {
                id,
                name: project.name.clone(),
                slug: project.slug.clone(),
                color: project.color.clone(),
            })
        })
    }

    /// Apply a partial update. Returns `None` if the project does not exist.
    pub fn update_project(&self, project_id: i64, patch: &ProjectPatch) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let Some(project) = get_project_internal(conn, project_id)? else {
                return Ok(None);
            };

            let updated = Project {
                id: project.id,
                name: patch.name.clone().unwrap_or(project.name),
                slug: patch.slug.clone().unwrap_or(project.slug),
                color: patch.color.clone().unwrap_or(project.color),
            };

            conn.execute(
                "UPDATE projects SET name = ?1, slug = ?2, color = ?3 WHERE id = ?4",
                params![updated.name, updated.slug, updated.color, project_id],
            )
            .map_err(map_slug_conflict)?;

            Ok(Some(updated))
        })
    }

    /// Delete a project, treating tasks that reference it according to `policy`.
    ///
    /// Deleting a missing project is a no-op under every policy.
    pub fn delete_project(&self, project_id: i64, policy: ProjectDeletePolicy) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_project_internal(&tx, project_id)?.is_none() {
                return Ok(());
            }

            let referencing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tasks WHERE project_id = ?1",
                params![project_id],
                |row| row.get(0),
            )?;

            match policy {
                ProjectDeletePolicy::Keep => {}
                ProjectDeletePolicy::Nullify => {
                    tx.execute(
                        "UPDATE tasks SET project_id = NULL WHERE project_id = ?1",
                        params![project_id],
                    )?;
                }
                ProjectDeletePolicy::Cascade => {
                    tx.execute(
                        "DELETE FROM tasks WHERE project_id = ?1",
                        params![project_id],
                    )?;
                }
                ProjectDeletePolicy::Restrict => {
                    if referencing > 0 {
                        return Err(ApiError::project_in_use(project_id, referencing).into());
                    }
                }
            }

            let deleted = tx.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            tx.commit()?;

            if deleted > 0 {
                info!(project_id, ?policy, tasks = referencing, "Deleted project");
            }
            Ok(())
        })
    }
}
