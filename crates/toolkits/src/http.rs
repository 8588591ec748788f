//! Shared HTTP plumbing for vendor clients.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use tool_core::ToolError;
use tracing::warn;

const USER_AGENT: &str = concat!("toolkits/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by a vendor integration.
pub fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read a JSON body, tolerating empty responses.
pub async fn json_body(response: Response) -> Result<Value, ToolError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Fail with a generic execution error on a non-success status.
pub async fn ensure_success(response: Response, vendor: &str) -> Result<Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(
        ToolError::execution(format!("{} API returned status {}", vendor, status))
            .with_developer_message(body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.zoom.us/v2/", "/users/me"),
            "https://api.zoom.us/v2/users/me"
        );
        assert_eq!(join_url("http://localhost:1234", "files"), "http://localhost:1234/files");
    }
}
