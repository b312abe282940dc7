//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::{Config, ProjectDeletePolicy};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the config file looked up in each tier directory.
const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/taskdeck/)
    Project = 1,
    /// User-level config (~/.taskdeck/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: TASKDECK_USER_DIR or ~/.taskdeck
        let user_dir = std::env::var("TASKDECK_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskdeck")));

        // Project dir: TASKDECK_PROJECT_DIR or $CWD/taskdeck
        let project_dir = std::env::var("TASKDECK_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskdeck")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Read a YAML file as a JSON value for merging. Missing files yield `None`.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_yaml::from_str::<Value>(&content).map_err(Into::into));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), %tier, error = %e, "Ignoring unreadable config file");
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers.
    ///
    /// `explicit` (or `TASKDECK_CONFIG_PATH`) names a single file that
    /// replaces the project and user tiers.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let explicit = explicit.or_else(|| std::env::var("TASKDECK_CONFIG_PATH").ok().map(PathBuf::from));
        Self::load_with_paths(ConfigPaths::discover(), explicit)
    }

    /// Load configuration with explicit tier directories.
    pub fn load_with_paths(paths: ConfigPaths, explicit: Option<PathBuf>) -> Result<Self> {
        let mut configs: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        if let Some(path) = explicit {
            // An explicit file must exist and parse
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            configs.push(value);
            sources.push(path);
        } else {
            let tiers = [
                (paths.project_dir.as_ref(), ConfigTier::Project),
                (paths.user_dir.as_ref(), ConfigTier::User),
            ];
            for (dir, tier) in tiers {
                let Some(dir) = dir else { continue };
                let file = dir.join(CONFIG_FILE);
                if let Some(value) = read_tier(&file, tier) {
                    configs.push(value);
                    sources.push(file);
                }
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        apply_overrides(&mut config, |key| std::env::var(key).ok());

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Apply the environment tier using `lookup` to read variables.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(db_path) = lookup("TASKDECK_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(host) = lookup("TASKDECK_HOST") {
        config.server.host = host;
    }

    if let Some(port) = lookup("TASKDECK_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid TASKDECK_PORT"),
        }
    }

    if let Some(policy) = lookup("TASKDECK_PROJECT_DELETE_POLICY") {
        match serde_json::from_value::<ProjectDeletePolicy>(Value::String(policy.clone())) {
            Ok(policy) => config.projects.delete_policy = policy,
            Err(_) => warn!(value = %policy, "Ignoring invalid TASKDECK_PROJECT_DELETE_POLICY"),
        }
    }

    if let Some(key) = lookup("AI_INTEGRATIONS_OPENAI_API_KEY").filter(|k| !k.is_empty()) {
        config.ai.api_key = Some(key);
    }

    if let Some(base_url) = lookup("AI_INTEGRATIONS_OPENAI_BASE_URL").filter(|u| !u.is_empty()) {
        config.ai.base_url = base_url;
    }

    if let Some(model) = lookup("TASKDECK_AI_MODEL") {
        config.ai.model = model;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PORT;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths, None).unwrap();
        assert!(loader.sources().is_empty());
        assert_eq!(loader.config().projects.delete_policy, ProjectDeletePolicy::Keep);
        assert!(loader.config().server.seed_on_startup);
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskdeck");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join(CONFIG_FILE),
            "server:\n  host: 0.0.0.0\nprojects:\n  delete_policy: nullify\n",
        )
        .unwrap();
        std::fs::write(
            user_dir.join(CONFIG_FILE),
            "projects:\n  delete_policy: cascade\n",
        )
        .unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with_paths(paths, None).unwrap();
        let config = loader.config();

        assert_eq!(config.projects.delete_policy, ProjectDeletePolicy::Cascade);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(loader.sources().len(), 2);
    }

    #[test]
    fn test_explicit_file_replaces_tiers() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskdeck");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join(CONFIG_FILE), "server:\n  host: 0.0.0.0\n").unwrap();

        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "server:\n  seed_on_startup: false\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths, Some(explicit)).unwrap();

        assert!(!loader.config().server.seed_on_startup);
        assert_eq!(loader.config().server.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(None, None);
        let result = ConfigLoader::load_with_paths(paths, Some(temp.path().join("nope.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("TASKDECK_PORT", "not-a-port"),
            ("TASKDECK_PROJECT_DELETE_POLICY", "restrict"),
            ("AI_INTEGRATIONS_OPENAI_API_KEY", "sk-test"),
            ("AI_INTEGRATIONS_OPENAI_BASE_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.projects.delete_policy, ProjectDeletePolicy::Restrict);
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.base_url, crate::config::DEFAULT_AI_BASE_URL);
    }
}
