//! Tools built from closures.
//!
//! [`FunctionTool::builder`] attaches metadata to a plain function, the way a
//! decorator would in a dynamic language:
//!
//! ```rust,ignore
//! let greet = FunctionTool::builder("Greet")
//!     .description("Say hello")
//!     .param(Param::of::<String>("name", "Who to greet"))
//!     .returns::<String>("The greeting")
//!     .handler(|_ctx, args| async move {
//!         Ok::<_, ToolError>(format!("Hello, {}!", args.get_string("name")?))
//!     });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::auth::ToolAuthRequirement;
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::param::ParamType;
use crate::schema::{
    InputParameter, ToolOutputSchema, ToolRequirements, ToolSecretRequirement, DEFAULT_DESCRIPTION,
};
use crate::tool::{Tool, ToolArgs};

type BoxFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;
type Handler = Arc<dyn Fn(ToolContext, ToolArgs) -> BoxFuture + Send + Sync>;

/// A [`Tool`] whose behaviour is a closure.
pub struct FunctionTool {
    name: String,
    description: Option<String>,
    parameters: Vec<InputParameter>,
    output: ToolOutputSchema,
    requirements: ToolRequirements,
    deprecation_message: Option<String>,
    handler: Handler,
}

impl FunctionTool {
    pub fn builder(name: impl Into<String>) -> FunctionToolBuilder {
        FunctionToolBuilder {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            output: ToolOutputSchema::nothing(),
            requirements: ToolRequirements::default(),
            deprecation_message: None,
        }
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

pub struct FunctionToolBuilder {
    name: String,
    description: Option<String>,
    parameters: Vec<InputParameter>,
    output: ToolOutputSchema,
    requirements: ToolRequirements,
    deprecation_message: Option<String>,
}

impl FunctionToolBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn param(mut self, param: InputParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn returns<T: ParamType>(mut self, description: impl Into<String>) -> Self {
        self.output = ToolOutputSchema::returns::<T>(description);
        self
    }

    pub fn requires_auth(mut self, requirement: ToolAuthRequirement) -> Self {
        self.requirements.authorization = Some(requirement);
        self
    }

    pub fn requires_secret(mut self, key: impl Into<String>) -> Self {
        self.requirements
            .secrets
            .push(ToolSecretRequirement { key: key.into() });
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = Some(message.into());
        self
    }

    /// Finish with an async handler.
    pub fn handler<F, Fut, T>(self, f: F) -> FunctionTool
    where
        F: Fn(ToolContext, ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ToolError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx: ToolContext, args: ToolArgs| -> BoxFuture {
            let fut = f(ctx, args);
            Box::pin(async move { Ok(serde_json::to_value(fut.await?)?) })
        });
        self.build(handler)
    }

    /// Finish with a synchronous handler, run on the blocking thread pool.
    pub fn blocking_handler<F, T>(self, f: F) -> FunctionTool
    where
        F: Fn(ToolContext, ToolArgs) -> Result<T, ToolError> + Send + Sync + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler: Handler = Arc::new(move |ctx: ToolContext, args: ToolArgs| -> BoxFuture {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let value = tokio::task::spawn_blocking(move || (*f)(ctx, args))
                    .await
                    .map_err(|e| {
                        ToolError::execution("tool panicked").with_developer_message(e.to_string())
                    })??;
                Ok(serde_json::to_value(value)?)
            })
        });
        self.build(handler)
    }

    fn build(self, handler: Handler) -> FunctionTool {
        FunctionTool {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            output: self.output,
            requirements: self.requirements,
            deprecation_message: self.deprecation_message,
            handler,
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }

    fn parameters(&self) -> Vec<InputParameter> {
        self.parameters.clone()
    }

    fn output(&self) -> ToolOutputSchema {
        self.output.clone()
    }

    fn requirements(&self) -> ToolRequirements {
        self.requirements.clone()
    }

    fn deprecation_message(&self) -> Option<&str> {
        self.deprecation_message.as_deref()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        (self.handler)(context.clone(), args).await
    }
}
