//! Self-describing tool definitions.
//!
//! A [`ToolDefinition`] is the JSON document a caller receives when it asks a
//! worker which tools exist: the tool's name, what it accepts, what it returns
//! and what it needs (authorization, secrets) before it can run.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::ToolAuthRequirement;
use crate::error::ToolError;

/// Description used when a tool or parameter does not document itself.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Primitive wire types a parameter or return value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    String,
    Integer,
    Number,
    Boolean,
    Json,
    Array,
}

impl WireType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::String => "string",
            WireType::Integer => "integer",
            WireType::Number => "number",
            WireType::Boolean => "boolean",
            WireType::Json => "json",
            WireType::Array => "array",
        }
    }

    /// Check a single JSON value against this type. Arrays are checked by
    /// [`ValueSchema::check`] since they need the inner type.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            WireType::String => value.is_string(),
            WireType::Integer => value.is_i64() || value.is_u64(),
            WireType::Number => value.is_number(),
            WireType::Boolean => value.is_boolean(),
            WireType::Json => true,
            WireType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    pub val_type: WireType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_val_type: Option<WireType>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ValueSchema {
    pub fn new(val_type: WireType) -> Self {
        Self {
            val_type,
            inner_val_type: None,
            enum_values: None,
        }
    }

    pub fn array(inner: WireType) -> Self {
        Self {
            val_type: WireType::Array,
            inner_val_type: Some(inner),
            enum_values: None,
        }
    }

    /// Restrict the value to one of the given strings.
    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Check a JSON value against this schema, returning a human-readable reason on mismatch.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if !self.val_type.accepts(value) {
            return Err(format!("expected {}", self.val_type));
        }

        if let (WireType::Array, Some(inner)) = (self.val_type, self.inner_val_type) {
            // Checked by accepts() above.
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            for (index, item) in items.iter().enumerate() {
                if !inner.accepts(item) {
                    return Err(format!("expected {} at index {}", inner, index));
                }
            }
        }

        if let Some(allowed) = &self.enum_values {
            let is_allowed = |v: &Value| {
                v.as_str()
                    .map(|s| allowed.iter().any(|a| a == s))
                    .unwrap_or(false)
            };
            let ok = match value.as_array() {
                Some(items) => items.iter().all(is_allowed),
                None => is_allowed(value),
            };
            if !ok {
                return Err(format!("must be one of: {}", allowed.join(", ")));
            }
        }

        Ok(())
    }
}

/// A declared tool input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParameter {
    pub name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value_schema: ValueSchema,
    /// Whether a model may infer this value from conversation context.
    #[serde(default = "default_inferrable")]
    pub inferrable: bool,
}

fn default_inferrable() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    pub parameters: Vec<InputParameter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Value,
    Error,
    Null,
    Artifact,
    RequiresAuthorization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value_schema: ValueSchema,
}

/// What a tool can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutputSchema {
    pub available_modes: Vec<OutputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OutputValue>,
}

impl ToolOutputSchema {
    pub fn allows(&self, mode: OutputMode) -> bool {
        self.available_modes.contains(&mode)
    }

    /// Check a tool's return value against the declared output.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            if self.allows(OutputMode::Null) {
                return Ok(());
            }
            return Err("tool returned no value".to_string());
        }

        if !self.allows(OutputMode::Value) {
            return Err("tool does not declare a return value".to_string());
        }

        match &self.value {
            Some(output) => output.value_schema.check(value),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSecretRequirement {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<ToolAuthRequirement>,
    #[serde(default)]
    pub secrets: Vec<ToolSecretRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolkitDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `Toolkit.Tool`, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FullyQualifiedName {
    pub toolkit: String,
    pub name: String,
}

impl FullyQualifiedName {
    pub fn new(toolkit: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            toolkit: toolkit.into(),
            name: name.into(),
        }
    }

    /// Lowercased form used as a lookup key.
    pub fn key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.toolkit, self.name)
    }
}

impl FromStr for FullyQualifiedName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((toolkit, name)) if !toolkit.is_empty() && !name.is_empty() => {
                Ok(Self::new(toolkit, name))
            }
            _ => Err(ToolError::invalid_parameter(
                "name",
                format!("'{}' is not of the form Toolkit.Tool", s),
            )),
        }
    }
}

impl TryFrom<String> for FullyQualifiedName {
    type Error = ToolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FullyQualifiedName> for String {
    fn from(value: FullyQualifiedName) -> Self {
        value.to_string()
    }
}

impl PartialEq for FullyQualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.toolkit.eq_ignore_ascii_case(&other.toolkit)
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for FullyQualifiedName {}

impl Hash for FullyQualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// The full, serializable description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub fully_qualified_name: FullyQualifiedName,
    pub description: String,
    pub toolkit: ToolkitDefinition,
    pub input: ToolInput,
    pub output: ToolOutputSchema,
    #[serde(default)]
    pub requirements: ToolRequirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

impl ToolDefinition {
    /// Look up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&InputParameter> {
        self.input.parameters.iter().find(|p| p.name == name)
    }

    pub fn requires_authorization(&self) -> bool {
        self.requirements.authorization.is_some()
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        let fail = |reason: String| ToolError::Definition {
            tool: self.name.clone(),
            reason,
        };

        if !is_valid_name(&self.name) {
            return Err(fail(format!(
                "name '{}' must be non-empty and contain only letters, digits and underscores",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for param in &self.input.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(fail(format!("duplicate parameter '{}'", param.name)));
            }
            check_schema(&param.value_schema).map_err(|reason| {
                fail(format!("parameter '{}': {}", param.name, reason))
            })?;
        }

        if self.output.available_modes.is_empty() {
            return Err(fail("output must declare at least one mode".to_string()));
        }
        if let Some(value) = &self.output.value {
            check_schema(&value.value_schema).map_err(|reason| fail(format!("output: {}", reason)))?;
        }

        Ok(())
    }
}

/// Tool names are identifiers: ASCII letters, digits and underscores.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_schema(schema: &ValueSchema) -> Result<(), String> {
    match (schema.val_type, schema.inner_val_type) {
        (WireType::Array, None) => return Err("array without an inner type".to_string()),
        (WireType::Array, Some(WireType::Array)) => {
            return Err("nested arrays are not supported".to_string())
        }
        (other, Some(_)) if other != WireType::Array => {
            return Err(format!("inner type is only valid on arrays, not {}", other))
        }
        _ => {}
    }

    if schema.enum_values.is_some() {
        let enum_target = match schema.val_type {
            WireType::Array => schema.inner_val_type,
            other => Some(other),
        };
        if enum_target != Some(WireType::String) {
            return Err("enum values are only supported on strings".to_string());
        }
    }

    Ok(())
}
