//! HTTP worker that serves the bundled toolkits.
//!
//! Routes:
//! - `GET /worker/health`: liveness and enabled tool count
//! - `GET /worker/tools`: definitions of every enabled tool
//! - `POST /worker/tools/invoke`: run a `ToolCallRequest`

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use config::{Config, ConfigError};
pub use error::WorkerError;
pub use state::AppState;

/// Router with state attached, ready to serve.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
