//! Structured error types for API responses.

use crate::validation::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidFieldValue,
    MissingRequiredField,

    // Not found errors
    TaskNotFound,
    ProjectNotFound,
    TagNotFound,

    // Conflict errors
    AlreadyExists,
    ProjectInUse,

    // Upstream / internal errors
    UpstreamError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this error class.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidFieldValue | ErrorCode::MissingRequiredField => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::TaskNotFound | ErrorCode::ProjectNotFound | ErrorCode::TagNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::AlreadyExists | ErrorCode::ProjectInUse => StatusCode::CONFLICT,
            ErrorCode::UpstreamError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error returned by handlers.
///
/// Serializes as `{ "message": ..., "field": ... }`; the code only selects the
/// status.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn task_not_found() -> Self {
        Self::new(ErrorCode::TaskNotFound, "Task not found")
    }

    pub fn project_not_found() -> Self {
        Self::new(ErrorCode::ProjectNotFound, "Project not found")
    }

    pub fn tag_not_found() -> Self {
        Self::new(ErrorCode::TagNotFound, "Tag not found")
    }

    pub fn already_exists(entity: &str, field: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("A {} with this {} already exists", entity, field),
        )
        .with_field(field)
    }

    pub fn project_in_use(project_id: i64, task_count: i64) -> Self {
        Self::new(
            ErrorCode::ProjectInUse,
            format!(
                "Project {} is referenced by {} task(s)",
                project_id, task_count
            ),
        )
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    /// Generic internal error. The cause is logged, never returned.
    pub fn internal(err: impl fmt::Display) -> Self {
        tracing::error!(error = %err, "Internal error");
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = if err.message == crate::validation::REQUIRED {
            ErrorCode::MissingRequiredField
        } else {
            ErrorCode::InvalidFieldValue
        };
        let api = Self::new(code, err.message);
        match err.field {
            Some(field) => api.with_field(field),
            None => api,
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Domain errors travel through the db layer inside anyhow
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<ValidationError>() {
                Ok(validation) => validation.into(),
                Err(err) => ApiError::internal(err),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for handler operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_without_code() {
        let err = ApiError::already_exists("tag", "name");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["field"], "name");
        assert!(json.get("code").is_none());
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_omits_field() {
        let json = serde_json::to_value(ApiError::task_not_found()).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Task not found" }));
    }

    #[test]
    fn test_anyhow_downcast_recovers_domain_error() {
        let err: anyhow::Error = ApiError::project_in_use(3, 2).into();
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::ProjectInUse);

        let api: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(api.code, ErrorCode::InternalError);
        assert_eq!(api.message, "Internal server error");
    }
}
