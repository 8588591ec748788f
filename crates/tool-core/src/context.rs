//! Per-call context handed to every tool.

use serde::{Deserialize, Serialize};

use crate::auth::ToolAuthorizationContext;
use crate::error::ToolError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSecretItem {
    pub key: String,
    pub value: String,
}

/// Authorization, secrets and caller identity for a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<ToolAuthorizationContext>,
    #[serde(default)]
    pub secrets: Vec<ToolSecretItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.authorization
            .get_or_insert_with(ToolAuthorizationContext::default)
            .token = Some(token.into());
        self
    }

    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.push(ToolSecretItem {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    fn token(&self) -> Option<&str> {
        self.authorization
            .as_ref()
            .and_then(|a| a.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// The OAuth token for this call.
    pub fn auth_token(&self) -> Result<&str, ToolError> {
        self.token()
            .ok_or_else(|| ToolError::execution("authorization token missing"))
    }

    pub fn get_auth_token_or_empty(&self) -> &str {
        self.token().unwrap_or("")
    }

    /// Look up a secret by key, ignoring case.
    pub fn get_secret(&self, key: &str) -> Result<&str, ToolError> {
        self.find_secret(key)
            .ok_or_else(|| ToolError::execution(format!("Secret {} is not set.", key)))
    }

    pub(crate) fn find_secret(&self, key: &str) -> Option<&str> {
        self.secrets
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(key))
            .map(|s| s.value.as_str())
    }
}
