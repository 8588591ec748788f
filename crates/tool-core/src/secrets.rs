//! Secret lookup from the call context and the process environment.

use std::env;

use crate::context::ToolContext;
use crate::error::ToolError;

/// Read a secret from the environment, falling back to `default`.
pub fn get_secret(name: &str, default: Option<&str>) -> Result<String, ToolError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => default
            .map(str::to_string)
            .ok_or_else(|| ToolError::execution(format!("Secret {} is not set.", name))),
    }
}

/// Secret from the call context if present, otherwise from the environment.
pub fn resolve_secret(context: &ToolContext, name: &str) -> Result<String, ToolError> {
    if let Some(value) = context.find_secret(name) {
        return Ok(value.to_string());
    }
    get_secret(name, None)
}
