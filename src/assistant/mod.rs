//! Natural-language task assistant.
//!
//! Handlers talk to an injected [`TaskAssistant`]; the production
//! implementation calls an OpenAI-compatible chat completions API.

mod openai;

pub use openai::OpenAiAssistant;

use crate::config::AiConfig;
use crate::types::TaskDraft;
use crate::validation;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Tasks extracted from free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub tasks: Vec<TaskDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_project: Option<String>,
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is not configured")]
    Disabled,

    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed assistant response: {0}")]
    Malformed(String),
}

/// Turns free text into task drafts and tasks into subtasks.
#[async_trait]
pub trait TaskAssistant: Send + Sync {
    /// Extract task drafts from a natural-language prompt.
    async fn extract_tasks(&self, text: &str) -> Result<Extraction, AssistantError>;

    /// Suggest subtask titles for an existing task.
    async fn breakdown(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<String>, AssistantError>;
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAssistant;

#[async_trait]
impl TaskAssistant for DisabledAssistant {
    async fn extract_tasks(&self, _text: &str) -> Result<Extraction, AssistantError> {
        Err(AssistantError::Disabled)
    }

    async fn breakdown(
        &self,
        _title: &str,
        _description: Option<&str>,
    ) -> Result<Vec<String>, AssistantError> {
        Err(AssistantError::Disabled)
    }
}

/// Build the assistant described by `config`.
pub fn from_config(config: &AiConfig) -> Arc<dyn TaskAssistant> {
    match config.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Arc::new(OpenAiAssistant::new(&config.base_url, key, &config.model)),
        None => {
            tracing::warn!("No AI API key configured; assistant endpoints will fail");
            Arc::new(DisabledAssistant)
        }
    }
}

fn parse_object(content: &str) -> Result<serde_json::Map<String, Value>, AssistantError> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AssistantError::Malformed("expected a JSON object".into())),
        Err(e) => Err(AssistantError::Malformed(e.to_string())),
    }
}

/// Parse an extraction reply: `{ "tasks": [TaskInsert], "suggestedProject"? }`.
///
/// Each draft must pass task insert validation.
pub fn parse_extraction(content: &str) -> Result<Extraction, AssistantError> {
    let map = parse_object(content)?;

    let Some(Value::Array(items)) = map.get("tasks") else {
        return Err(AssistantError::Malformed("missing \"tasks\" array".into()));
    };

    let tasks = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            validation::new_task(item).map_err(|e| match e.field {
                Some(field) => AssistantError::Malformed(format!("tasks.{i}.{field}: {}", e.message)),
                None => AssistantError::Malformed(format!("tasks.{i}: {}", e.message)),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let suggested_project = match map.get("suggestedProject") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(AssistantError::Malformed(
                "\"suggestedProject\" must be a string".into(),
            ));
        }
    };

    Ok(Extraction {
        tasks,
        suggested_project,
    })
}

/// Parse a breakdown reply: `{ "subtasks": [string] }`.
pub fn parse_breakdown(content: &str) -> Result<Vec<String>, AssistantError> {
    let map = parse_object(content)?;

    let Some(Value::Array(items)) = map.get("subtasks") else {
        return Err(AssistantError::Malformed("missing \"subtasks\" array".into()));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(AssistantError::Malformed(format!(
                "subtasks.{i} must be a string"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    #[test]
    fn test_parse_extraction_applies_defaults() {
        let extraction = parse_extraction(
            r#"{"tasks":[{"title":"Finish report","priority":"high","dueDate":"2024-10-27T00:00:00Z"},{"title":"Email John"}],"suggestedProject":"Work"}"#,
        )
        .unwrap();

        assert_eq!(extraction.tasks.len(), 2);
        assert_eq!(extraction.tasks[0].priority, Priority::High);
        assert!(extraction.tasks[0].due_date.is_some());
        assert_eq!(extraction.tasks[1].priority, Priority::Medium);
        assert_eq!(extraction.suggested_project.as_deref(), Some("Work"));
    }

    #[test]
    fn test_parse_extraction_rejects_bad_draft() {
        let err = parse_extraction(r#"{"tasks":[{"title":"ok"},{"priority":"high"}]}"#).unwrap_err();
        match err {
            AssistantError::Malformed(msg) => assert!(msg.starts_with("tasks.1.title")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_extraction_requires_tasks() {
        assert!(matches!(
            parse_extraction("{}"),
            Err(AssistantError::Malformed(_))
        ));
        assert!(matches!(
            parse_extraction("not json"),
            Err(AssistantError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_breakdown() {
        let subtasks = parse_breakdown(r#"{"subtasks":["Outline","Draft","Review"]}"#).unwrap();
        assert_eq!(subtasks, vec!["Outline", "Draft", "Review"]);

        assert!(parse_breakdown(r#"{"subtasks":["a", 2]}"#).is_err());
        assert!(parse_breakdown(r#"["a"]"#).is_err());
    }

    #[test]
    fn test_extraction_serializes_camel_case() {
        let extraction = Extraction {
            tasks: vec![TaskDraft::titled("Buy milk")],
            suggested_project: Some("Personal".into()),
        };
        let json = serde_json::to_value(&extraction).unwrap();
        assert_eq!(json["suggestedProject"], "Personal");
        assert_eq!(json["tasks"][0]["title"], "Buy milk");
        assert_eq!(json["tasks"][0]["priority"], "medium");
    }

    #[tokio::test]
    async fn test_disabled_assistant_fails() {
        let assistant = DisabledAssistant;
        assert!(matches!(
            assistant.extract_tasks("anything").await,
            Err(AssistantError::Disabled)
        ));
        assert!(matches!(
            assistant.breakdown("t", None).await,
            Err(AssistantError::Disabled)
        ));
    }
}
