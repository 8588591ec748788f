use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tool_core::{ToolContext, ToolError};
use tracing::{debug, warn};

use crate::http::{build_client, join_url, json_body};

pub const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Self {
        Self::with_base_url(GMAIL_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    /// Call an endpoint relative to the authenticated user's mailbox.
    pub async fn request(
        &self,
        context: &ToolContext,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ToolError> {
        let url = join_url(&self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(context.auth_token()?);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return json_body(response).await;
        }

        let text = response.text().await.unwrap_or_default();
        warn!("Gmail API error {} on {}", status, endpoint);
        Err(match status {
            StatusCode::UNAUTHORIZED => ToolError::execution(
                "Google authorization failed. Please make sure your token is valid.",
            ),
            StatusCode::NOT_FOUND => {
                ToolError::execution(format!("Gmail resource not found: {}", endpoint))
            }
            _ => ToolError::execution(format!("Gmail API returned status {}", status)),
        }
        .with_developer_message(text))
    }

    pub async fn get(
        &self,
        context: &ToolContext,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ToolError> {
        self.request(context, Method::GET, endpoint, query, None)
            .await
    }

    pub async fn post(
        &self,
        context: &ToolContext,
        endpoint: &str,
        body: &Value,
    ) -> Result<Value, ToolError> {
        self.request(context, Method::POST, endpoint, &[], Some(body))
            .await
    }

    /// The signed-in user's address.
    pub async fn profile_email(&self, context: &ToolContext) -> Result<String, ToolError> {
        let profile = self.get(context, "profile", &[]).await?;
        profile["emailAddress"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ToolError::execution("Gmail profile has no email address"))
    }

    pub async fn get_message(&self, context: &ToolContext, id: &str) -> Result<Value, ToolError> {
        self.get(
            context,
            &format!("messages/{}", id),
            &[("format", "full".to_string())],
        )
        .await
    }

    pub async fn send_raw(
        &self,
        context: &ToolContext,
        raw: String,
        thread_id: Option<&str>,
    ) -> Result<Value, ToolError> {
        let mut body = json!({"raw": raw});
        if let Some(thread_id) = thread_id {
            body["threadId"] = json!(thread_id);
        }
        self.post(context, "messages/send", &body).await
    }

    pub async fn list_labels(&self, context: &ToolContext) -> Result<Vec<Value>, ToolError> {
        let data = self.get(context, "labels", &[]).await?;
        Ok(data["labels"].as_array().cloned().unwrap_or_default())
    }
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}
