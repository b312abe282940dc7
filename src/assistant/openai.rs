//! OpenAI-compatible chat completions client.

use super::{AssistantError, Extraction, TaskAssistant, parse_breakdown, parse_extraction};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EXTRACT_PROMPT: &str = "You are a productivity assistant. Pull the actionable tasks out of the user's message.
Reply with a JSON object holding a \"tasks\" array. Every task has:
- title: string
- description: string (optional)
- priority: \"low\" | \"medium\" | \"high\" (guess from the wording, medium when unclear)
- dueDate: ISO 8601 timestamp (optional, resolve phrases like \"tomorrow\" or \"next week\")
You may add \"suggestedProject\": string when the tasks clearly belong to one project.

Example input: \"Finish the report by Friday and email John\"
Example output: { \"tasks\": [{ \"title\": \"Finish report\", \"dueDate\": \"2023-10-27T00:00:00Z\" }, { \"title\": \"Email John\" }] }";

const BREAKDOWN_PROMPT: &str = "Split the task below into 3 to 5 smaller, concrete subtasks. \
Reply with a JSON object holding a \"subtasks\" array of strings.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Assistant backed by `{base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiAssistant {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAssistant {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Run one JSON-mode completion and return the reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, AssistantError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.model, %url, "Sending chat completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Malformed(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::Malformed("completion has no content".into()))
    }
}

#[async_trait]
impl TaskAssistant for OpenAiAssistant {
    async fn extract_tasks(&self, text: &str) -> Result<Extraction, AssistantError> {
        let system = format!("{EXTRACT_PROMPT}\n\nCurrent time: {}", Utc::now().to_rfc3339());
        let content = self.complete(&system, text).await?;
        parse_extraction(&content)
    }

    async fn breakdown(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<String>, AssistantError> {
        let user = format!(
            "Task: {}\nDescription: {}",
            title,
            description.unwrap_or("No description")
        );
        let content = self.complete(BREAKDOWN_PROMPT, &user).await?;
        parse_breakdown(&content)
    }
}
