//! HTTP server implementation for the task API.
//!
//! Routes come from [`super::contract`]; every failure is rendered as
//! `{ "message": ..., "field"?: ... }` through [`ApiError`].

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::contract::{self, ENDPOINTS};
use crate::assistant::{Extraction, TaskAssistant};
use crate::config::ProjectDeletePolicy;
use crate::db::Database;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::{Project, Status, Tag, Task, TaskFilter};
use crate::validation;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    assistant: Arc<dyn TaskAssistant>,
    delete_policy: ProjectDeletePolicy,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        assistant: Arc<dyn TaskAssistant>,
        delete_policy: ProjectDeletePolicy,
    ) -> Self {
        Self {
            db,
            assistant,
            delete_policy,
        }
    }
}

/// Unwrap a JSON body, reporting malformed input in the API error shape.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(ErrorCode::InvalidFieldValue, rejection.body_text()))
}

/// Path ids that are not integers can never match a row.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Raw list filters. Values arrive as strings and are coerced leniently.
///
/// Keys may repeat; the first value that coerces wins.
#[derive(Debug, Default)]
pub struct TaskListParams {
    project_id: Vec<String>,
    status: Vec<String>,
    search: Vec<String>,
}

impl TaskListParams {
    /// Collect the recognised keys from decoded query pairs.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "projectId" => params.project_id.push(value),
                "status" => params.status.push(value),
                "search" => params.search.push(value),
                _ => {}
            }
        }
        params
    }

    /// Absent, empty or unparseable values mean the filter is not supplied.
    pub fn into_filter(self) -> TaskFilter {
        TaskFilter {
            project_id: self.project_id.iter().find_map(|s| s.trim().parse().ok()),
            status: self.status.iter().find_map(|s| Status::parse(s)),
            search: self.search.into_iter().find(|s| !s.is_empty()),
        }
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskListParams::from_pairs(pairs).into_filter();
    Ok(Json(state.db.list_tasks(&filter)?))
}

async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    let id = parse_id(&id).ok_or_else(ApiError::task_not_found)?;
    state
        .db
        .get_task(id)?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

async fn get_task_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Tag>>> {
    let id = parse_id(&id).ok_or_else(ApiError::task_not_found)?;
    if state.db.get_task(id)?.is_none() {
        return Err(ApiError::task_not_found());
    }
    Ok(Json(state.db.get_task_tags(id)?))
}

async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let (task, tag_ids) = validation::parse_task_create(&body)?;
    let created = state.db.create_task(&task, tag_ids.as_deref())?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let body = json_body(body)?;
    let (patch, tag_ids) = validation::parse_task_update(&body)?;
    let id = parse_id(&id).ok_or_else(ApiError::task_not_found)?;
    state
        .db
        .update_task(id, &patch, tag_ids.as_deref())?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if let Some(id) = parse_id(&id) {
        state.db.delete_task(id)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.db.get_projects()?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id).ok_or_else(ApiError::project_not_found)?;
    state
        .db
        .get_project(id)?
        .map(Json)
        .ok_or_else(ApiError::project_not_found)
}

async fn create_project(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let project = validation::new_project(&body)?;
    let created = state.db.create_project(&project)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    let body = json_body(body)?;
    let patch = validation::project_patch(&body)?;
    let id = parse_id(&id).ok_or_else(ApiError::project_not_found)?;
    state
        .db
        .update_project(id, &patch)?
        .map(Json)
        .ok_or_else(ApiError::project_not_found)
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if let Some(id) = parse_id(&id) {
        state.db.delete_project(id, state.delete_policy)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.db.get_tags()?))
}

async fn create_tag(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let tag = validation::new_tag(&body)?;
    let created = state.db.create_tag(&tag)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Tag>> {
    let body = json_body(body)?;
    let patch = validation::tag_patch(&body)?;
    let id = parse_id(&id).ok_or_else(ApiError::tag_not_found)?;
    state
        .db
        .update_tag(id, &patch)?
        .map(Json)
        .ok_or_else(ApiError::tag_not_found)
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BreakdownResponse {
    subtasks: Vec<String>,
}

async fn ai_process(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Extraction>> {
    let body = json_body(body)?;
    let prompt = validation::ai_prompt(&body)?;

    let extraction = state.assistant.extract_tasks(&prompt).await.map_err(|e| {
        error!(error = %e, "AI process failed");
        ApiError::upstream("Failed to process AI request")
    })?;

    info!(tasks = extraction.tasks.len(), "Extracted tasks from prompt");
    Ok(Json(extraction))
}

async fn ai_breakdown(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<BreakdownResponse>> {
    let body = json_body(body)?;
    let task_id = validation::ai_task_id(&body)?;
    let task = state
        .db
        .get_task(task_id)?
        .ok_or_else(ApiError::task_not_found)?;

    let subtasks = state
        .assistant
        .breakdown(&task.title, task.description.as_deref())
        .await
        .map_err(|e| {
            error!(task_id, error = %e, "AI breakdown failed");
            ApiError::upstream("Failed to generate breakdown")
        })?;

    Ok(Json(BreakdownResponse { subtasks }))
}

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// API root - returns available endpoints.
async fn api_root() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(contract::TASKS_PATH, get(list_tasks).post(create_task))
        .route(
            contract::TASK_PATH,
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(contract::TASK_TAGS_PATH, get(get_task_tags))
        .route(
            contract::PROJECTS_PATH,
            get(list_projects).post(create_project),
        )
        .route(
            contract::PROJECT_PATH,
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
        .route(contract::TAGS_PATH, get(list_tags).post(create_tag))
        .route(contract::TAG_PATH, patch(update_tag))
        .route(contract::AI_PROCESS_PATH, post(ai_process))
        .route(contract::AI_BREAKDOWN_PATH, post(ai_breakdown))
        .route(contract::INDEX_PATH, get(api_root))
        .route(contract::HEALTH_PATH, get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the API server and serve it in the background.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    state: AppState,
    host: &str,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_list_params_coercion() {
        let filter = TaskListParams::from_pairs(pairs(&[
            ("projectId", "abc"),
            ("status", "in_progress"),
            ("search", ""),
        ]))
        .into_filter();
        assert_eq!(filter.project_id, None);
        assert_eq!(filter.status, Some(Status::InProgress));
        assert_eq!(filter.search, None);

        let filter = TaskListParams::from_pairs(pairs(&[
            ("projectId", "7"),
            ("status", "done"),
            ("search", "milk"),
            ("page", "2"),
        ]))
        .into_filter();
        assert_eq!(filter.project_id, Some(7));
        assert_eq!(filter.status, None);
        assert_eq!(filter.search.as_deref(), Some("milk"));
    }

    #[test]
    fn test_list_params_repeated_keys() {
        let filter = TaskListParams::from_pairs(pairs(&[
            ("status", "bogus"),
            ("status", "todo"),
            ("status", "completed"),
            ("projectId", ""),
            ("projectId", "3"),
            ("search", ""),
            ("search", "milk"),
        ]))
        .into_filter();
        assert_eq!(filter.status, Some(Status::Todo));
        assert_eq!(filter.project_id, Some(3));
        assert_eq!(filter.search.as_deref(), Some("milk"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("12a"), None);
    }
}
