//! HTTP routes.

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

mod health;
mod tools;

/// Build the worker router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/worker/health", get(health::health))
        .route("/worker/tools", get(tools::list_tools))
        .route("/worker/tools/invoke", post(tools::invoke_tool))
}
