//! Print every bundled tool, then run a few math tools through the executor.
//!
//! Run with: cargo run -p toolkits --example list_tools

use serde_json::{json, Value};
use tool_core::{ToolCallRequest, ToolExecutor, ToolReference};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("toolkits=debug".parse()?)
                .add_directive("tool_core=debug".parse()?),
        )
        .init();

    let executor = ToolExecutor::new(toolkits::default_catalog()?);

    println!("=== Registered tools ===\n");
    for definition in executor.definitions() {
        let auth = definition
            .requirements
            .authorization
            .as_ref()
            .map(|a| format!(" [oauth2: {}]", a.provider()))
            .unwrap_or_default();
        println!(
            "  - {}{}: {}",
            definition.fully_qualified_name, auth, definition.description
        );
    }
    println!();

    println!("=== Math ===\n");
    let cases = [
        ("Add", json!({"a": "0.1", "b": "0.2"})),
        ("Divide", json!({"a": "1", "b": "0"})),
        ("Factorial", json!({"a": 20})),
        ("Median", json!({"numbers": [3.0, 1.0, 2.0]})),
    ];
    for (name, inputs) in cases {
        let inputs = match inputs {
            Value::Object(map) => map,
            _ => continue,
        };
        let request = ToolCallRequest::new(ToolReference::new("Math", name), inputs);
        let response = executor.call(request).await?;
        match (&response.output.value, &response.output.error) {
            (Some(value), _) => println!("  [OK]    {} => {}", name, value),
            (None, Some(error)) => println!("  [ERROR] {} => {}", name, error.message),
            (None, None) => println!("  [NULL]  {}", name),
        }
    }

    Ok(())
}
