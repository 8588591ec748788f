//! Tool trait definition and argument access.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::ToolContext;
use crate::error::ToolError;
use crate::schema::{InputParameter, ToolOutputSchema, ToolRequirements, DEFAULT_DESCRIPTION};

/// Validated arguments passed to a tool for execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Build arguments from a JSON object; any other value yields no arguments.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(params) => Self { params },
            _ => Self::default(),
        }
    }

    /// Value for `key`, treating an explicit null as absent.
    fn present(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&Value, ToolError> {
        self.present(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.present(key).is_some()
    }

    /// Get a string parameter, returning an error if missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.required(key)?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::invalid_parameter(key, "expected string"))
    }

    /// Get an optional string parameter.
    pub fn get_string_opt(&self, key: &str) -> Option<String> {
        self.present(key)?.as_str().map(|s| s.to_string())
    }

    /// Get a boolean parameter, returning an error if missing or not a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool, ToolError> {
        self.required(key)?
            .as_bool()
            .ok_or_else(|| ToolError::invalid_parameter(key, "expected boolean"))
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.present(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ToolError> {
        self.required(key)?
            .as_i64()
            .ok_or_else(|| ToolError::invalid_parameter(key, "expected integer"))
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, ToolError> {
        match self.present(key) {
            Some(_) => self.get_i64(key),
            None => Ok(default),
        }
    }

    /// Get an f64 parameter, returning an error if missing or not a number.
    pub fn get_f64(&self, key: &str) -> Result<f64, ToolError> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| ToolError::invalid_parameter(key, "expected number"))
    }

    /// Deserialize a parameter into any `serde` type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ToolError> {
        let value = self.required(key)?;
        serde_json::from_value(value.clone())
            .map_err(|e| ToolError::invalid_parameter(key, e.to_string()))
    }

    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ToolError> {
        match self.present(key) {
            Some(_) => self.get(key).map(Some),
            None => Ok(None),
        }
    }
}

/// A self-describing, invocable unit.
///
/// The metadata methods feed [`crate::ToolCatalog::create_tool_definition`];
/// the executor validates inputs against `parameters()` before calling
/// `execute` and checks the result against `output()` afterwards.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name within its toolkit, e.g. `ListItemsInFolder`.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        DEFAULT_DESCRIPTION
    }

    fn parameters(&self) -> Vec<InputParameter> {
        Vec::new()
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::nothing()
    }

    fn requirements(&self) -> ToolRequirements {
        ToolRequirements::default()
    }

    /// Set when the tool is kept for compatibility but should no longer be used.
    fn deprecation_message(&self) -> Option<&str> {
        None
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError>;
}
