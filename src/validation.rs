//! Request payload validation.
//!
//! Two modes are supported for every entity kind:
//! - **insert**: required fields must be present, generated fields (`id`,
//!   `createdAt`) must not be.
//! - **partial update**: every field is optional, but a present field must
//!   satisfy the same constraints as on insert. For nullable columns an
//!   explicit `null` clears the value.
//!
//! Validation is fail-fast: the first offending field is reported with its
//! dotted path (`tagIds.2`). Unknown keys are ignored.

use crate::types::{
    DEFAULT_COLOR, NewProject, NewTag, NewTask, Priority, ProjectPatch, Status, TagPatch,
    TaskPatch,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Message used when a required field is missing.
pub const REQUIRED: &str = "Required";

/// Keys the server generates; clients may not supply them.
const GENERATED_FIELDS: [&str; 2] = ["id", "createdAt"];

/// First validation failure found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Dotted path of the failing field, if the failure is field-specific.
    pub field: Option<String>,
}

impl ValidationError {
    fn at(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// Entity kinds that accept client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Project,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedInsert {
    Task(NewTask),
    Project(NewProject),
    Tag(NewTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedPartial {
    Task(TaskPatch),
    Project(ProjectPatch),
    Tag(TagPatch),
}

/// Validate a full insert payload for the given entity kind.
pub fn validate_insert(
    kind: EntityKind,
    payload: &Value,
) -> Result<ValidatedInsert, ValidationError> {
    match kind {
        EntityKind::Task => new_task(payload).map(ValidatedInsert::Task),
        EntityKind::Project => new_project(payload).map(ValidatedInsert::Project),
        EntityKind::Tag => new_tag(payload).map(ValidatedInsert::Tag),
    }
}

/// Validate a partial update payload for the given entity kind.
pub fn validate_update(
    kind: EntityKind,
    payload: &Value,
) -> Result<ValidatedPartial, ValidationError> {
    match kind {
        EntityKind::Task => task_patch(payload).map(ValidatedPartial::Task),
        EntityKind::Project => project_patch(payload).map(ValidatedPartial::Project),
        EntityKind::Tag => tag_patch(payload).map(ValidatedPartial::Tag),
    }
}

pub fn new_task(payload: &Value) -> Result<NewTask, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(NewTask {
        title: fields.required_string("title")?,
        description: fields.nullable_string("description")?.flatten(),
        priority: fields.optional_priority()?.unwrap_or_default(),
        status: fields.optional_status()?.unwrap_or_default(),
        due_date: fields.nullable_datetime("dueDate")?.flatten(),
        project_id: fields.nullable_integer("projectId")?.flatten(),
        position: fields.optional_integer("position")?.unwrap_or(0),
        parent_id: fields.nullable_integer("parentId")?.flatten(),
    })
}

pub fn task_patch(payload: &Value) -> Result<TaskPatch, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(TaskPatch {
        title: fields.optional_string("title")?,
        description: fields.nullable_string("description")?,
        priority: fields.optional_priority()?,
        status: fields.optional_status()?,
        due_date: fields.nullable_datetime("dueDate")?,
        project_id: fields.nullable_integer("projectId")?,
        position: fields.optional_integer("position")?,
        parent_id: fields.nullable_integer("parentId")?,
    })
}

pub fn new_project(payload: &Value) -> Result<NewProject, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(NewProject {
        name: fields.required_string("name")?,
        slug: fields.required_string("slug")?,
        color: fields
            .optional_string("color")?
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    })
}

pub fn project_patch(payload: &Value) -> Result<ProjectPatch, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(ProjectPatch {
        name: fields.optional_string("name")?,
        slug: fields.optional_string("slug")?,
        color: fields.optional_string("color")?,
    })
}

pub fn new_tag(payload: &Value) -> Result<NewTag, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(NewTag {
        name: fields.required_string("name")?,
        color: fields
            .optional_string("color")?
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    })
}

pub fn tag_patch(payload: &Value) -> Result<TagPatch, ValidationError> {
    let fields = Fields::client(payload)?;
    Ok(TagPatch {
        name: fields.optional_string("name")?,
        color: fields.optional_string("color")?,
    })
}

/// Parse a task creation body: a task insert plus optional `tagIds`.
pub fn parse_task_create(
    payload: &Value,
) -> Result<(NewTask, Option<Vec<i64>>), ValidationError> {
    let task = new_task(payload)?;
    let tag_ids = Fields::client(payload)?.optional_id_list("tagIds")?;
    Ok((task, tag_ids))
}

/// Parse a task update body: a partial task plus optional `tagIds`.
///
/// `tagIds: []` and an absent `tagIds` are different: the first clears all
/// tags, the second leaves them alone.
pub fn parse_task_update(
    payload: &Value,
) -> Result<(TaskPatch, Option<Vec<i64>>), ValidationError> {
    let patch = task_patch(payload)?;
    let tag_ids = Fields::client(payload)?.optional_id_list("tagIds")?;
    Ok((patch, tag_ids))
}

/// Parse an AI process body: `{ "prompt": string }`.
pub fn ai_prompt(payload: &Value) -> Result<String, ValidationError> {
    Fields::object(payload)?.required_string("prompt")
}

/// Parse an AI breakdown body: `{ "taskId": integer }`.
pub fn ai_task_id(payload: &Value) -> Result<i64, ValidationError> {
    Fields::object(payload)?
        .optional_integer("taskId")?
        .ok_or_else(|| ValidationError::at("taskId", REQUIRED))
}

/// Name of a JSON value's type, as used in error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(field: &str, what: &str, got: &Value) -> ValidationError {
    ValidationError::at(field, format!("Expected {}, received {}", what, type_name(got)))
}

fn enum_message(allowed: &[&str], got: &str) -> String {
    let options: Vec<String> = allowed.iter().map(|v| format!("'{}'", v)).collect();
    format!(
        "Invalid enum value. Expected {}, received '{}'",
        options.join(" | "),
        got
    )
}

/// Field reader over a JSON object payload.
struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn object(payload: &'a Value) -> Result<Self, ValidationError> {
        match payload {
            Value::Object(map) => Ok(Self { map }),
            other => Err(ValidationError {
                message: format!("Expected object, received {}", type_name(other)),
                field: None,
            }),
        }
    }

    /// Read a client payload: must be an object without generated keys.
    fn client(payload: &'a Value) -> Result<Self, ValidationError> {
        let fields = Self::object(payload)?;
        fields.forbid_generated()?;
        Ok(fields)
    }

    fn forbid_generated(&self) -> Result<(), ValidationError> {
        for key in GENERATED_FIELDS {
            if self.map.contains_key(key) {
                return Err(ValidationError::at(
                    key,
                    format!("{} is generated by the server and cannot be set", key),
                ));
            }
        }
        Ok(())
    }

    fn required_string(&self, key: &str) -> Result<String, ValidationError> {
        self.optional_string(key)?
            .ok_or_else(|| ValidationError::at(key, REQUIRED))
    }

    fn optional_string(&self, key: &str) -> Result<Option<String>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(expected(key, "string", other)),
        }
    }

    fn nullable_string(&self, key: &str) -> Result<Option<Option<String>>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
            Some(other) => Err(expected(key, "string", other)),
        }
    }

    fn optional_integer(&self, key: &str) -> Result<Option<i64>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(value) => integer(key, value).map(Some),
        }
    }

    fn nullable_integer(&self, key: &str) -> Result<Option<Option<i64>>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(value) => integer(key, value).map(|n| Some(Some(n))),
        }
    }

    fn nullable_datetime(
        &self,
        key: &str,
    ) -> Result<Option<Option<DateTime<Utc>>>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) => parse_timestamp(s)
                .map(|dt| Some(Some(dt)))
                .ok_or_else(|| ValidationError::at(key, "Invalid date")),
            Some(other) => Err(expected(key, "date string", other)),
        }
    }

    fn optional_priority(&self) -> Result<Option<Priority>, ValidationError> {
        let allowed: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
        self.optional_enum("priority", &allowed, Priority::parse)
    }

    fn optional_status(&self) -> Result<Option<Status>, ValidationError> {
        let allowed: Vec<&str> = Status::ALL.iter().map(|s| s.as_str()).collect();
        self.optional_enum("status", &allowed, Status::parse)
    }

    fn optional_enum<T>(
        &self,
        key: &str,
        allowed: &[&str],
        parse: fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ValidationError> {
        match self.optional_string(key)? {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| ValidationError::at(key, enum_message(allowed, &s))),
        }
    }

    fn optional_id_list(&self, key: &str) -> Result<Option<Vec<i64>>, ValidationError> {
        match self.map.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| integer(&format!("{}.{}", key, i), item))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(expected(key, "array", other)),
        }
    }
}

fn integer(field: &str, value: &Value) -> Result<i64, ValidationError> {
    value
        .as_i64()
        .ok_or_else(|| expected(field, "integer", value))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        // Storage keeps milliseconds; drop anything finer
        return DateTime::from_timestamp_millis(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_applies_defaults() {
        let task = new_task(&json!({ "title": "Buy milk", "priority": "low" })).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.position, 0);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_ai_bodies() {
        assert_eq!(ai_prompt(&json!({ "prompt": "plan week" })).unwrap(), "plan week");
        assert_eq!(ai_prompt(&json!({})).unwrap_err().field.as_deref(), Some("prompt"));
        assert_eq!(ai_task_id(&json!({ "taskId": 3 })).unwrap(), 3);
        let err = ai_task_id(&json!({ "taskId": "3" })).unwrap_err();
        assert_eq!(err.message, "Expected integer, received string");
    }

    #[test]
    fn test_insert_requires_title() {
        let err = new_task(&json!({ "description": "no title" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("title"));
        assert_eq!(err.message, REQUIRED);
    }

    #[test]
    fn test_first_failure_wins() {
        // Both title and priority are bad; title is checked first.
        let err = new_task(&json!({ "title": 5, "priority": "urgent" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("title"));
        assert_eq!(err.message, "Expected string, received integer");
    }

    #[test]
    fn test_enum_outside_closed_set() {
        let err = task_patch(&json!({ "status": "done" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("status"));
        assert!(err.message.contains("'in_progress'"));
        assert!(err.message.ends_with("received 'done'"));
    }

    #[test]
    fn test_generated_fields_rejected() {
        let err = new_tag(&json!({ "id": 4, "name": "x" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("id"));
        let err = task_patch(&json!({ "createdAt": "2024-01-01T00:00:00Z" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("createdAt"));
    }

    #[test]
    fn test_partial_distinguishes_null_from_absent() {
        let patch = task_patch(&json!({ "projectId": null })).unwrap();
        assert_eq!(patch.project_id, Some(None));
        assert_eq!(patch.description, None);

        let patch = task_patch(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_tag_ids_empty_vs_absent() {
        let (_, ids) = parse_task_update(&json!({ "tagIds": [] })).unwrap();
        assert_eq!(ids, Some(vec![]));
        let (_, ids) = parse_task_update(&json!({ "title": "x" })).unwrap();
        assert_eq!(ids, None);
    }

    #[test]
    fn test_tag_ids_report_element_path() {
        let err = parse_task_create(&json!({ "title": "x", "tagIds": [1, "two"] })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("tagIds.1"));
    }

    #[test]
    fn test_color_accepts_any_string() {
        let project = new_project(&json!({ "name": "Work", "slug": "work", "color": "blue-ish" }))
            .unwrap();
        assert_eq!(project.color, "blue-ish");
        let tag = new_tag(&json!({ "name": "Urgent" })).unwrap();
        assert_eq!(tag.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_non_object_payload() {
        let err = validate_insert(EntityKind::Project, &json!([1, 2])).unwrap_err();
        assert_eq!(err.field, None);
        assert_eq!(err.message, "Expected object, received array");
    }

    #[test]
    fn test_due_date_formats() {
        let task = new_task(&json!({ "title": "x", "dueDate": "2024-03-01" })).unwrap();
        assert_eq!(
            task.due_date.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        let err = new_task(&json!({ "title": "x", "dueDate": "next friday" })).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("dueDate"));
    }

    #[test]
    fn test_due_date_truncated_to_millis() {
        let task = new_task(&json!({ "title": "x", "dueDate": "2024-01-01T00:00:00.123456Z" }))
            .unwrap();
        assert_eq!(
            task.due_date.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00.123+00:00"
        );
    }

    #[test]
    fn test_position_must_be_integer() {
        let err = task_patch(&json!({ "position": 1.5 })).unwrap_err();
        assert_eq!(err.message, "Expected integer, received float");
    }
}
