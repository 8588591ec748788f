//! Request and response payloads exchanged with the calling runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::ToolAuthRequirement;
use crate::context::ToolContext;

/// Which tool to call. `toolkit` may be omitted when the tool name is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolkit: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ToolReference {
    pub fn new(toolkit: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            toolkit: Some(toolkit.into()),
            name: name.into(),
            version: None,
        }
    }

    /// Name used for catalog lookup.
    pub fn lookup_name(&self) -> String {
        match &self.toolkit {
            Some(toolkit) => format!("{}.{}", toolkit, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Caller timestamp, kept as sent. Callers emit ISO 8601 with or without an offset.
    pub created_at: Option<String>,
    pub tool: ToolReference,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub context: ToolContext,
}

impl ToolCallRequest {
    pub fn new(tool: ToolReference, inputs: Map<String, Value>) -> Self {
        Self {
            execution_id: None,
            created_at: None,
            tool,
            inputs,
            context: ToolContext::default(),
        }
    }

    pub fn with_context(mut self, context: ToolContext) -> Self {
        self.context = context;
        self
    }
}

/// Error details returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
    #[serde(default)]
    pub can_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_prompt_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// Exactly one of `value`, `error` or `requires_authorization` is set;
/// none is set for a tool that returned null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolCallError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_authorization: Option<ToolAuthRequirement>,
}

impl ToolCallOutput {
    pub fn value(value: Value) -> Self {
        Self {
            value: (!value.is_null()).then_some(value),
            ..Self::default()
        }
    }

    pub fn error(error: ToolCallError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn requires_authorization(requirement: ToolAuthRequirement) -> Self {
        Self {
            requires_authorization: Some(requirement),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.requires_authorization.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub execution_id: String,
    pub finished_at: String,
    /// Wall-clock duration in milliseconds.
    pub duration: f64,
    pub success: bool,
    pub output: ToolCallOutput,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: ToolCallRequest = serde_json::from_value(json!({
            "tool": {"name": "Add"}
        }))
        .unwrap();
        assert!(request.execution_id.is_none());
        assert!(request.inputs.is_empty());
        assert_eq!(request.tool.lookup_name(), "Add");
        assert_eq!(ToolReference::new("Math", "Add").lookup_name(), "Math.Add");
    }

    #[test]
    fn test_request_created_at_without_offset() {
        let request: ToolCallRequest = serde_json::from_value(json!({
            "execution_id": "exec-1",
            "created_at": "2024-10-01T12:00:00.123456",
            "tool": {"toolkit": "Math", "name": "Add"},
            "inputs": {"a": "1", "b": "2"}
        }))
        .unwrap();
        assert_eq!(request.created_at.as_deref(), Some("2024-10-01T12:00:00.123456"));
        assert_eq!(request.inputs.len(), 2);
    }

    #[test]
    fn test_null_value_output() {
        let output = ToolCallOutput::value(Value::Null);
        assert!(output.is_success());
        assert_eq!(serde_json::to_value(&output).unwrap(), json!({}));
    }

    #[test]
    fn test_requires_authorization_output() {
        let output =
            ToolCallOutput::requires_authorization(ToolAuthRequirement::zoom(["meeting:read"]));
        assert!(!output.is_success());
        let encoded = serde_json::to_value(&output).unwrap();
        assert_eq!(encoded["requires_authorization"]["provider_id"], "zoom");
    }
}
