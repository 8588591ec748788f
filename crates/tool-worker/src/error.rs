//! Error types for the tool worker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tool_core::ToolError;

use crate::config::ConfigError;

/// Errors returned by worker routes.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown or disabled tool.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Request body is not a valid tool call.
    #[error("{0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool error: {0}")]
    Tool(ToolError),
}

impl From<ToolError> for WorkerError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => WorkerError::NotFound(name),
            other => WorkerError::Tool(other),
        }
    }
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::Unauthorized => StatusCode::UNAUTHORIZED,
            WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WorkerError::Config(err) => {
                tracing::error!("Configuration error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WorkerError::Tool(err) => {
                tracing::error!("Tool error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for worker handlers.
pub type Result<T> = std::result::Result<T, WorkerError>;
