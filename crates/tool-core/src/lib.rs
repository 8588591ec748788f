//! Core building blocks for self-describing vendor API tools.
//!
//! A tool is a function with metadata: a name, a description, typed
//! parameters, a declared return value and the authorization or secrets it
//! needs. This crate turns that metadata into a serializable
//! [`ToolDefinition`] and runs tools against it.
//!
//! # Architecture
//!
//! - [`Tool`] is the trait every tool implements. Vendor integrations usually
//!   implement it on a struct that owns a `reqwest::Client`; small tools can be
//!   built from a closure with [`FunctionTool::builder`].
//! - [`Param`] and [`ParamType`] derive parameter schemas from Rust types.
//! - [`Toolkit`] groups the tools of one integration under a name and version.
//! - [`ToolCatalog`] validates definitions and looks tools up by
//!   `Toolkit.Tool` name.
//! - [`ToolExecutor`] checks requirements and inputs, runs the tool with an
//!   optional timeout and checks the output, producing a [`ToolCallResponse`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tool_core::{FunctionTool, Param, ToolCatalog, ToolExecutor, Toolkit, ToolError};
//!
//! let greet = FunctionTool::builder("Greet")
//!     .description("Say hello")
//!     .param(Param::of::<String>("name", "Who to greet"))
//!     .returns::<String>("The greeting")
//!     .handler(|_ctx, args| async move {
//!         Ok::<_, ToolError>(format!("Hello, {}!", args.get_string("name")?))
//!     });
//!
//! let mut catalog = ToolCatalog::new();
//! catalog.add_toolkit(&Toolkit::new("Demo", "0.1.0").tool(greet))?;
//! let executor = ToolExecutor::new(catalog);
//! ```

mod auth;
mod call;
mod catalog;
mod context;
mod error;
mod executor;
mod function_tool;
mod param;
mod schema;
pub mod secrets;
mod tool;
mod toolkit;

pub use auth::{OAuth2Requirement, ToolAuthRequirement, ToolAuthorizationContext};
pub use call::{
    ToolCallError, ToolCallOutput, ToolCallRequest, ToolCallResponse, ToolReference,
};
pub use catalog::{CatalogEntry, ToolCatalog};
pub use context::{ToolContext, ToolSecretItem};
pub use error::ToolError;
pub use executor::{validate_inputs, ExecutionPolicy, ToolExecutor};
pub use function_tool::{FunctionTool, FunctionToolBuilder};
pub use param::{Param, ParamType};
pub use schema::{
    is_valid_name, FullyQualifiedName, InputParameter, OutputMode, OutputValue, ToolDefinition,
    ToolInput, ToolOutputSchema, ToolRequirements, ToolSecretRequirement, ToolkitDefinition,
    ValueSchema, WireType, DEFAULT_DESCRIPTION,
};
pub use secrets::{get_secret, resolve_secret};
pub use tool::{Tool, ToolArgs};
pub use toolkit::Toolkit;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
