use reqwest::header::RETRY_AFTER;
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tool_core::{ToolContext, ToolError};
use tracing::{debug, warn};

use crate::http::{build_client, join_url, json_body};

pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";

const DEFAULT_RETRY_AFTER_SECS: f64 = 1.0;

pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
}

impl DiscordClient {
    pub fn new() -> Self {
        Self::with_base_url(DISCORD_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    /// Send a request and map failures to user-facing errors.
    ///
    /// `action` completes the sentence "Failed to ..." in error messages,
    /// e.g. `"list messages"`.
    pub async fn request(
        &self,
        context: &ToolContext,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        action: &str,
    ) -> Result<Value, ToolError> {
        let token = context.auth_token().map_err(|_| {
            ToolError::execution("Discord authorization is required for this tool.")
                .with_developer_message("No authorization token provided in context")
        })?;

        let url = join_url(&self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            ToolError::execution(format!("Failed to {} due to a network error.", action))
                .with_developer_message(format!("Request error: {}", e))
        })?;

        if response.status().is_success() {
            return json_body(response).await;
        }
        Err(error_from_response(response, action).await)
    }
}

impl DiscordClient {
    /// Post to a webhook. The id and token in the path are the credentials,
    /// so no OAuth token is sent.
    pub async fn execute_webhook(
        &self,
        webhook_id: &str,
        webhook_token: &str,
        payload: &Value,
    ) -> Result<(StatusCode, Value), ToolError> {
        let url = join_url(
            &self.base_url,
            &format!("webhooks/{}/{}", webhook_id, webhook_token),
        );
        debug!("POST webhook {}", webhook_id);

        let response = self
            .http
            .post(&url)
            .query(&[("wait", "true")])
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                ToolError::execution("Failed to send webhook message due to a network error.")
                    .with_developer_message(format!("Request error: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok((status, json_body(response).await?));
        }
        Err(error_from_response(response, "send webhook message").await)
    }
}

impl Default for DiscordClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn error_from_response(response: Response, action: &str) -> ToolError {
    let status = response.status();
    let header_retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());

    let text = response.text().await.unwrap_or_default();
    let body: Option<Value> = serde_json::from_str(&text).ok();
    let message = body
        .as_ref()
        .and_then(|b| b["message"].as_str())
        .map(str::to_string)
        .unwrap_or(text);
    let retry_after = header_retry_after
        .or_else(|| body.as_ref().and_then(|b| b["retry_after"].as_f64()));

    warn!("Discord API error {} while trying to {}", status, action);
    map_status(status, &message, retry_after, action)
}

/// Translate a Discord error status into a [`ToolError`].
pub fn map_status(
    status: StatusCode,
    message: &str,
    retry_after: Option<f64>,
    action: &str,
) -> ToolError {
    let developer_message = format!("{} (Code: {})", message, status.as_u16());
    let err = match status {
        StatusCode::UNAUTHORIZED => ToolError::execution(
            "Authentication failed. Please make sure your Discord token is valid.",
        ),
        StatusCode::FORBIDDEN => {
            ToolError::execution(format!("You don't have permission to {}.", action))
        }
        StatusCode::NOT_FOUND => ToolError::execution(format!(
            "The Discord resource was not found while trying to {}.",
            action
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            let seconds = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS).max(0.0);
            return ToolError::retryable(format!(
                "Discord rate limit exceeded. Please try again after {} seconds.",
                seconds
            ))
            .with_developer_message(developer_message)
            .with_retry_after_ms((seconds * 1000.0).ceil() as u64);
        }
        _ => ToolError::execution(format!("Failed to {}. {}", action, message)),
    };
    err.with_developer_message(developer_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_messages() {
        let err = map_status(StatusCode::UNAUTHORIZED, "401: Unauthorized", None, "list servers");
        assert_eq!(
            err.to_string(),
            "Authentication failed. Please make sure your Discord token is valid."
        );
        assert_eq!(
            err.developer_message().as_deref(),
            Some("401: Unauthorized (Code: 401)")
        );

        let err = map_status(StatusCode::FORBIDDEN, "Missing Access", None, "send message");
        assert_eq!(err.to_string(), "You don't have permission to send message.");
        assert!(!err.can_retry());

        let err = map_status(StatusCode::NOT_FOUND, "Unknown Channel", None, "list messages");
        assert_eq!(
            err.to_string(),
            "The Discord resource was not found while trying to list messages."
        );

        let err = map_status(StatusCode::BAD_GATEWAY, "upstream", None, "list channels");
        assert_eq!(err.to_string(), "Failed to list channels. upstream");
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = map_status(
            StatusCode::TOO_MANY_REQUESTS,
            "You are being rate limited.",
            Some(2.5),
            "send message",
        );
        assert!(err.can_retry());
        assert_eq!(
            err.to_string(),
            "Discord rate limit exceeded. Please try again after 2.5 seconds."
        );
        assert_eq!(err.to_call_error().retry_after_ms, Some(2500));
    }
}
