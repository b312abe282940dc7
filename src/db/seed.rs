//! Sample data for a fresh database.

use super::Database;
use crate::types::{NewProject, NewTag, NewTask, Priority, Status};
use anyhow::Result;
use tracing::info;

impl Database {
    /// Populate an empty database with sample projects, tags and tasks.
    ///
    /// Does nothing unless the task, project and tag tables are all empty.
    /// Returns whether data was inserted.
    pub fn seed(&self) -> Result<bool> {
        if self.count_tasks()? > 0 || !self.get_projects()?.is_empty() || !self.get_tags()?.is_empty()
        {
            return Ok(false);
        }

        let work = self.create_project(&NewProject {
            name: "Work".into(),
            slug: "work".into(),
            color: "#3b82f6".into(),
        })?;
        let personal = self.create_project(&NewProject {
            name: "Personal".into(),
            slug: "personal".into(),
            color: "#10b981".into(),
        })?;

        let urgent = self.create_tag(&NewTag {
            name: "Urgent".into(),
            color: "#ef4444".into(),
        })?;
        let learning = self.create_tag(&NewTag {
            name: "Learning".into(),
            color: "#8b5cf6".into(),
        })?;

        self.create_task(
            &NewTask {
                description: Some("Draft the initial requirements and timeline".into()),
                priority: Priority::High,
                project_id: Some(work.id),
                ..NewTask::titled("Complete project proposal")
            },
            Some(&[urgent.id]),
        )?;

        self.create_task(
            &NewTask {
                description: Some("Milk, eggs, bread".into()),
                project_id: Some(personal.id),
                ..NewTask::titled("Buy groceries")
            },
            None,
        )?;

        self.create_task(
            &NewTask {
                description: Some("Read documentation and practice".into()),
                priority: Priority::Low,
                status: Status::InProgress,
                project_id: Some(personal.id),
                ..NewTask::titled("Learn TypeScript Generics")
            },
            Some(&[learning.id]),
        )?;

        info!("Seeded database with sample projects, tags and tasks");
        Ok(true)
    }
}
