//! Tool listing and invocation.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tool_core::{ToolCallRequest, ToolCallResponse, ToolDefinition};
use tracing::info;

use crate::auth::authorize;
use crate::error::{Result, WorkerError};
use crate::state::AppState;

/// Definitions of every enabled tool.
pub async fn list_tools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ToolDefinition>>> {
    authorize(state.secret.as_deref(), &headers)?;

    let definitions = state
        .executor
        .definitions()
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(definitions))
}

/// Run one tool call. Tool failures come back inside a 200 response.
///
/// The body is parsed only after the caller is authorized.
pub async fn invoke_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ToolCallResponse>> {
    authorize(state.secret.as_deref(), &headers)?;

    let request: ToolCallRequest = serde_json::from_slice(&body)
        .map_err(|e| WorkerError::BadRequest(format!("Invalid tool call request: {}", e)))?;

    info!("Invoking tool {}", request.tool.lookup_name());
    let response = state.executor.call(request).await?;
    Ok(Json(response))
}
