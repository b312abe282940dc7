//! Shared description of the HTTP API surface.
//!
//! The router registers its routes from these constants, so clients building
//! URLs with [`build_url`] stay in step with the server.

use serde::Serialize;

/// A single API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: &'static str,
    pub path: &'static str,
}

impl Endpoint {
    const fn new(name: &'static str, method: &'static str, path: &'static str) -> Self {
        Self { name, method, path }
    }
}

pub const TASKS_PATH: &str = "/api/tasks";
pub const TASK_PATH: &str = "/api/tasks/{id}";
pub const TASK_TAGS_PATH: &str = "/api/tasks/{id}/tags";
pub const PROJECTS_PATH: &str = "/api/projects";
pub const PROJECT_PATH: &str = "/api/projects/{id}";
pub const TAGS_PATH: &str = "/api/tags";
pub const TAG_PATH: &str = "/api/tags/{id}";
pub const AI_PROCESS_PATH: &str = "/api/ai/process";
pub const AI_BREAKDOWN_PATH: &str = "/api/ai/breakdown";
pub const INDEX_PATH: &str = "/api";
pub const HEALTH_PATH: &str = "/api/health";

pub const LIST_TASKS: Endpoint = Endpoint::new("tasks.list", "GET", TASKS_PATH);
pub const GET_TASK: Endpoint = Endpoint::new("tasks.get", "GET", TASK_PATH);
pub const GET_TASK_TAGS: Endpoint = Endpoint::new("tasks.tags", "GET", TASK_TAGS_PATH);
pub const CREATE_TASK: Endpoint = Endpoint::new("tasks.create", "POST", TASKS_PATH);
pub const UPDATE_TASK: Endpoint = Endpoint::new("tasks.update", "PATCH", TASK_PATH);
pub const DELETE_TASK: Endpoint = Endpoint::new("tasks.delete", "DELETE", TASK_PATH);

pub const LIST_PROJECTS: Endpoint = Endpoint::new("projects.list", "GET", PROJECTS_PATH);
pub const GET_PROJECT: Endpoint = Endpoint::new("projects.get", "GET", PROJECT_PATH);
pub const CREATE_PROJECT: Endpoint = Endpoint::new("projects.create", "POST", PROJECTS_PATH);
pub const UPDATE_PROJECT: Endpoint = Endpoint::new("projects.update", "PATCH", PROJECT_PATH);
pub const DELETE_PROJECT: Endpoint = Endpoint::new("projects.delete", "DELETE", PROJECT_PATH);

pub const LIST_TAGS: Endpoint = Endpoint::new("tags.list", "GET", TAGS_PATH);
pub const CREATE_TAG: Endpoint = Endpoint::new("tags.create", "POST", TAGS_PATH);
pub const UPDATE_TAG: Endpoint = Endpoint::new("tags.update", "PATCH", TAG_PATH);

pub const AI_PROCESS: Endpoint = Endpoint::new("ai.process", "POST", AI_PROCESS_PATH);
pub const AI_BREAKDOWN: Endpoint = Endpoint::new("ai.breakdown", "POST", AI_BREAKDOWN_PATH);

pub const API_INDEX: Endpoint = Endpoint::new("index", "GET", INDEX_PATH);
pub const HEALTH: Endpoint = Endpoint::new("health", "GET", HEALTH_PATH);

/// Every endpoint the server exposes.
pub const ENDPOINTS: &[Endpoint] = &[
    LIST_TASKS,
    GET_TASK,
    GET_TASK_TAGS,
    CREATE_TASK,
    UPDATE_TASK,
    DELETE_TASK,
    LIST_PROJECTS,
    GET_PROJECT,
    CREATE_PROJECT,
    UPDATE_PROJECT,
    DELETE_PROJECT,
    LIST_TAGS,
    CREATE_TAG,
    UPDATE_TAG,
    AI_PROCESS,
    AI_BREAKDOWN,
    API_INDEX,
    HEALTH,
];

/// Look up an endpoint by name.
pub fn endpoint(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.name == name)
}

/// Fill `{name}` placeholders in `path` with percent-encoded values.
///
/// Params without a matching placeholder are ignored; placeholders without a
/// param are left in place.
///
/// ```
/// use taskdeck::api::contract::{build_url, GET_TASK};
///
/// assert_eq!(build_url(GET_TASK.path, &[("id", "42")]), "/api/tasks/42");
/// ```
pub fn build_url(path: &str, params: &[(&str, &str)]) -> String {
    let mut url = path.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{key}}}");
        if url.contains(&placeholder) {
            url = url.replacen(&placeholder, &urlencoding::encode(value), 1);
        }
    }
    url
}
