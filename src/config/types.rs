//! Configuration types and structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 5000;

/// Default base URL for the OpenAI-compatible chat completions API.
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub projects: ProjectsConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind the HTTP API to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP API (default: 5000).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Insert sample data at startup when the database is empty.
    #[serde(default = "default_seed_on_startup")]
    pub seed_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            seed_on_startup: default_seed_on_startup(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskdeck/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_seed_on_startup() -> bool {
    true
}

/// What happens to tasks referencing a project when it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectDeletePolicy {
    /// Tasks keep their (now dangling) project id.
    #[default]
    Keep,
    /// Referencing tasks have their project id cleared.
    Nullify,
    /// Referencing tasks are deleted along with the project.
    Cascade,
    /// Deletion is refused while any task references the project.
    Restrict,
}

/// Project handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectsConfig {
    #[serde(default)]
    pub delete_policy: ProjectDeletePolicy,
}

/// AI assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// API key. The assistant is disabled when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model name.
    #[serde(default = "default_ai_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            api_key: None,
            model: default_ai_model(),
        }
    }
}

fn default_ai_base_url() -> String {
    DEFAULT_AI_BASE_URL.to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
projects:
  delete_policy: restrict
server:
  port: 8080
"#,
        )
        .unwrap();
        assert_eq!(config.projects.delete_policy, ProjectDeletePolicy::Restrict);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.server.seed_on_startup);
        assert!(config.ai.api_key.is_none());
    }
}
