//! Runs catalog tools: requirement checks, input validation, timeout and
//! output validation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::call::{ToolCallOutput, ToolCallRequest, ToolCallResponse};
use crate::catalog::ToolCatalog;
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::schema::ToolDefinition;
use crate::secrets::resolve_secret;
use crate::tool::{Tool, ToolArgs};

#[derive(Debug, Clone, Default)]
pub struct ExecutionPolicy {
    pub timeout: Option<Duration>,
    /// Fully qualified names, lowercased.
    pub disabled_tools: HashSet<String>,
}

impl ExecutionPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn disable_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tool in tools {
            self.disabled_tools.insert(tool.as_ref().to_lowercase());
        }
        self
    }

    pub fn is_disabled(&self, definition: &ToolDefinition) -> bool {
        self.disabled_tools
            .contains(&definition.fully_qualified_name.key())
    }
}

pub struct ToolExecutor {
    catalog: Arc<ToolCatalog>,
    policy: ExecutionPolicy,
}

impl ToolExecutor {
    pub fn new(catalog: ToolCatalog) -> Self {
        Self::with_policy(catalog, ExecutionPolicy::default())
    }

    pub fn with_policy(catalog: ToolCatalog, policy: ExecutionPolicy) -> Self {
        Self::from_shared(Arc::new(catalog), policy)
    }

    pub fn from_shared(catalog: Arc<ToolCatalog>, policy: ExecutionPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        self.catalog.as_ref()
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Definitions of the tools this executor will run.
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.catalog
            .definitions()
            .into_iter()
            .filter(|d| !self.policy.is_disabled(d))
            .collect()
    }

    /// Resolve and run the requested tool.
    ///
    /// Returns `Err(ToolError::NotFound)` when the tool is unknown or disabled;
    /// every other failure is reported inside the response.
    pub async fn call(&self, request: ToolCallRequest) -> Result<ToolCallResponse, ToolError> {
        let name = request.tool.lookup_name();
        let entry = self
            .catalog
            .get(&name)
            .ok_or_else(|| ToolError::NotFound(name.clone()))?;

        if self.policy.is_disabled(&entry.definition) {
            warn!("Refusing to run disabled tool: {}", name);
            return Err(ToolError::NotFound(name));
        }

        if let Some(message) = &entry.definition.deprecation_message {
            warn!(
                "Tool {} is deprecated: {}",
                entry.definition.fully_qualified_name, message
            );
        }

        let execution_id = request
            .execution_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let started = Instant::now();
        let output = self
            .run(
                entry.tool.as_ref(),
                &entry.definition,
                &request.context,
                &request.inputs,
            )
            .await;
        let duration = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            "Tool {} finished: execution_id={}, success={}, duration_ms={:.1}",
            entry.definition.fully_qualified_name,
            execution_id,
            output.is_success(),
            duration
        );

        Ok(ToolCallResponse {
            execution_id,
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration,
            success: output.is_success(),
            output,
        })
    }

    /// Run a tool against its definition. Never fails: errors become outputs.
    pub async fn run(
        &self,
        tool: &dyn Tool,
        definition: &ToolDefinition,
        context: &ToolContext,
        inputs: &Map<String, Value>,
    ) -> ToolCallOutput {
        if let Some(requirement) = &definition.requirements.authorization {
            if !context.has_token() {
                debug!(
                    "Tool {} needs authorization from {}",
                    definition.fully_qualified_name,
                    requirement.provider()
                );
                return ToolCallOutput::requires_authorization(requirement.clone());
            }
        }

        for secret in &definition.requirements.secrets {
            if let Err(err) = resolve_secret(context, &secret.key) {
                return ToolCallOutput::error(err.to_call_error());
            }
        }

        let args = match validate_inputs(definition, inputs) {
            Ok(args) => args,
            Err(err) => {
                debug!(
                    "Rejected inputs for {}: {}",
                    definition.fully_qualified_name, err
                );
                return ToolCallOutput::error(err.to_call_error());
            }
        };

        let result = match self.policy.timeout {
            Some(limit) => match timeout(limit, tool.execute(context, args)).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout(limit)),
            },
            None => tool.execute(context, args).await,
        };

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "Tool {} failed: {}",
                    definition.fully_qualified_name, err
                );
                return ToolCallOutput::error(err.to_call_error());
            }
        };

        match definition.output.check(&value) {
            Ok(()) => ToolCallOutput::value(value),
            Err(reason) => {
                warn!(
                    "Tool {} returned invalid output: {}",
                    definition.fully_qualified_name, reason
                );
                ToolCallOutput::error(ToolError::Output(reason).to_call_error())
            }
        }
    }
}

/// Check inputs against declared parameters. Undeclared inputs are dropped.
pub fn validate_inputs(
    definition: &ToolDefinition,
    inputs: &Map<String, Value>,
) -> Result<ToolArgs, ToolError> {
    let mut params = Map::new();

    for param in &definition.input.parameters {
        match inputs.get(&param.name).filter(|v| !v.is_null()) {
            Some(value) => {
                param
                    .value_schema
                    .check(value)
                    .map_err(|reason| ToolError::invalid_parameter(&param.name, reason))?;
                params.insert(param.name.clone(), value.clone());
            }
            None if param.required => {
                return Err(ToolError::MissingParameter(param.name.clone()));
            }
            None => {}
        }
    }

    for key in inputs.keys() {
        if definition.parameter(key).is_none() {
            debug!(
                "Dropping undeclared input '{}' for {}",
                key, definition.fully_qualified_name
            );
        }
    }

    Ok(ToolArgs::new(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ToolAuthRequirement;
    use crate::call::ToolReference;
    use crate::function_tool::FunctionTool;
    use crate::param::Param;
    use crate::toolkit::Toolkit;
    use serde_json::json;

    fn inputs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn executor(policy: ExecutionPolicy) -> ToolExecutor {
        let add = FunctionTool::builder("Add")
            .param(Param::of::<i64>("a", "First"))
            .param(Param::of::<i64>("b", "Second"))
            .returns::<i64>("Sum")
            .handler(|_ctx, args| async move {
                Ok::<_, ToolError>(args.get_i64("a")? + args.get_i64("b")?)
            });

        let whoami = FunctionTool::builder("WhoAmI")
            .requires_auth(ToolAuthRequirement::github(["read:user"]))
            .returns::<String>("Token")
            .handler(|ctx, _args| async move { Ok::<_, ToolError>(ctx.auth_token()?.to_string()) });

        let lying = FunctionTool::builder("Lying")
            .returns::<i64>("Should be a number")
            .handler(|_ctx, _args| async { Ok("not a number") });

        let slow = FunctionTool::builder("Slow").handler(|_ctx, _args| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });

        let secretive = FunctionTool::builder("Secretive")
            .requires_secret("TOOL_CORE_EXECUTOR_TEST_KEY")
            .handler(|_ctx, _args| async { Ok(()) });

        let kit = Toolkit::new("Test", "0.1.0")
            .tool(add)
            .tool(whoami)
            .tool(lying)
            .tool(slow)
            .tool(secretive);

        let mut catalog = ToolCatalog::new();
        catalog.add_toolkit(&kit).unwrap();
        ToolExecutor::with_policy(catalog, policy)
    }

    #[tokio::test]
    async fn test_call_success() {
        let exec = executor(ExecutionPolicy::default());
        let request = ToolCallRequest::new(
            ToolReference::new("Test", "Add"),
            inputs(json!({"a": 2, "b": 3, "extra": "ignored"})),
        );
        let response = exec.call(request).await.unwrap();

        assert!(response.success);
        assert_eq!(response.output.value, Some(json!(5)));
        assert!(Uuid::parse_str(&response.execution_id).is_ok());
        assert!(response.finished_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_call_keeps_execution_id() {
        let exec = executor(ExecutionPolicy::default());
        let mut request =
            ToolCallRequest::new(ToolReference::new("Test", "Add"), inputs(json!({"a": 1, "b": 1})));
        request.execution_id = Some("exec-1".to_string());
        let response = exec.call(request).await.unwrap();
        assert_eq!(response.execution_id, "exec-1");
    }

    #[tokio::test]
    async fn test_input_validation() {
        let exec = executor(ExecutionPolicy::default());

        let missing = ToolCallRequest::new(ToolReference::new("Test", "Add"), inputs(json!({"a": 1})));
        let response = exec.call(missing).await.unwrap();
        assert!(!response.success);
        let error = response.output.error.unwrap();
        assert_eq!(error.message, "Missing required parameter: b");
        assert!(!error.can_retry);

        let wrong_type = ToolCallRequest::new(
            ToolReference::new("Test", "Add"),
            inputs(json!({"a": 1, "b": "two"})),
        );
        let response = exec.call(wrong_type).await.unwrap();
        assert_eq!(
            response.output.error.unwrap().message,
            "Invalid parameter 'b': expected integer"
        );
    }

    #[tokio::test]
    async fn test_requires_authorization() {
        let exec = executor(ExecutionPolicy::default());
        let request = ToolCallRequest::new(ToolReference::new("Test", "WhoAmI"), Map::new());
        let response = exec.call(request.clone()).await.unwrap();

        assert!(!response.success);
        let requirement = response.output.requires_authorization.unwrap();
        assert_eq!(requirement.provider(), "github");

        let response = exec
            .call(request.with_context(ToolContext::new().with_token("abc")))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.output.value, Some(json!("abc")));
    }

    #[tokio::test]
    async fn test_output_validation() {
        let exec = executor(ExecutionPolicy::default());
        let request = ToolCallRequest::new(ToolReference::new("Test", "Lying"), Map::new());
        let response = exec.call(request).await.unwrap();
        assert!(!response.success);
        assert!(response
            .output
            .error
            .unwrap()
            .message
            .starts_with("Invalid tool output"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let exec = executor(ExecutionPolicy::default().with_timeout(Duration::from_millis(20)));
        let request = ToolCallRequest::new(ToolReference::new("Test", "Slow"), Map::new());
        let response = exec.call(request).await.unwrap();
        let error = response.output.error.unwrap();
        assert!(error.can_retry);
        assert!(error.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let exec = executor(ExecutionPolicy::default());
        let request = ToolCallRequest::new(ToolReference::new("Test", "Secretive"), Map::new());
        let response = exec.call(request.clone()).await.unwrap();
        assert_eq!(
            response.output.error.unwrap().message,
            "Secret TOOL_CORE_EXECUTOR_TEST_KEY is not set."
        );

        let context = ToolContext::new().with_secret("TOOL_CORE_EXECUTOR_TEST_KEY", "v");
        let response = exec.call(request.with_context(context)).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_unknown_and_disabled() {
        let exec = executor(ExecutionPolicy::default().disable_tools(["Test.Lying"]));

        let unknown = ToolCallRequest::new(ToolReference::new("Test", "Nope"), Map::new());
        assert!(matches!(exec.call(unknown).await, Err(ToolError::NotFound(_))));

        let disabled = ToolCallRequest::new(ToolReference::new("Test", "Lying"), Map::new());
        assert!(matches!(exec.call(disabled).await, Err(ToolError::NotFound(_))));
        assert_eq!(exec.definitions().len(), exec.catalog().len() - 1);
    }
}
