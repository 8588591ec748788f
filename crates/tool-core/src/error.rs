//! Error types for tool definition and execution.

use std::time::Duration;

use thiserror::Error;

use crate::call::ToolCallError;

/// Errors that can occur while defining, registering or executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found in the catalog.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool's declared metadata is invalid.
    #[error("Invalid definition for tool '{tool}': {reason}")]
    Definition { tool: String, reason: String },

    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The tool ran and failed.
    #[error("{message}")]
    Execution {
        message: String,
        developer_message: Option<String>,
    },

    /// The tool failed, but the caller may retry (possibly with a changed prompt).
    #[error("{message}")]
    Retryable {
        message: String,
        developer_message: Option<String>,
        additional_prompt_content: Option<String>,
        retry_after_ms: Option<u64>,
    },

    /// The tool returned a value that does not match its declared output.
    #[error("Invalid tool output: {0}")]
    Output(String),

    /// The tool did not finish in time.
    #[error("Tool execution timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Create an execution error with a user-facing message.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            developer_message: None,
        }
    }

    /// Create a retryable error with a user-facing message.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
            developer_message: None,
            additional_prompt_content: None,
            retry_after_ms: None,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Attach a developer-facing message. No-op for variants that don't carry one.
    pub fn with_developer_message(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Execution {
                developer_message, ..
            }
            | Self::Retryable {
                developer_message, ..
            } => *developer_message = Some(text.into()),
            _ => {}
        }
        self
    }

    /// Attach extra prompt content for a retry. Only meaningful on `Retryable`.
    pub fn with_additional_prompt_content(mut self, text: impl Into<String>) -> Self {
        if let Self::Retryable {
            additional_prompt_content,
            ..
        } = &mut self
        {
            *additional_prompt_content = Some(text.into());
        }
        self
    }

    /// Attach a retry delay. Only meaningful on `Retryable`.
    pub fn with_retry_after_ms(mut self, ms: u64) -> Self {
        if let Self::Retryable { retry_after_ms, .. } = &mut self {
            *retry_after_ms = Some(ms);
        }
        self
    }

    /// Whether the caller may retry the call.
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Retryable { .. } | Self::Timeout(_))
    }

    /// Developer-facing detail, falling back to the error text for wrapped errors.
    pub fn developer_message(&self) -> Option<String> {
        match self {
            Self::Execution {
                developer_message, ..
            }
            | Self::Retryable {
                developer_message, ..
            } => developer_message.clone(),
            Self::Http(err) => Some(format!("{:?}", err)),
            Self::Json(err) => Some(format!("{:?}", err)),
            _ => None,
        }
    }

    /// Whether this error was raised while checking inputs, before the tool ran.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidParameter { .. }
        )
    }

    /// Translate into the error shape returned to callers.
    pub fn to_call_error(&self) -> ToolCallError {
        let (additional_prompt_content, retry_after_ms) = match self {
            Self::Retryable {
                additional_prompt_content,
                retry_after_ms,
                ..
            } => (additional_prompt_content.clone(), *retry_after_ms),
            _ => (None, None),
        };

        ToolCallError {
            message: self.to_string(),
            developer_message: self.developer_message(),
            can_retry: self.can_retry(),
            additional_prompt_content,
            retry_after_ms,
        }
    }
}
