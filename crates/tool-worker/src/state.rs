//! Application state shared across handlers.

use std::sync::Arc;

use tool_core::{ExecutionPolicy, ToolExecutor, Toolkit};
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::error::Result;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Executor over the served catalog.
    pub executor: Arc<ToolExecutor>,
    /// Bearer token required on tool routes.
    pub secret: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(executor: ToolExecutor, secret: Option<String>) -> Self {
        Self {
            executor: Arc::new(executor),
            secret,
        }
    }

    /// Build the catalog and policy described by `config` from the bundled toolkits.
    pub fn from_config(config: &Config) -> Result<Self> {
        let selected = select_toolkits(toolkits::all_toolkits(), config.toolkits.as_deref())?;
        let catalog = toolkits::catalog_from(&selected)?;

        let mut policy = ExecutionPolicy::default().disable_tools(config.disabled_tools.iter());
        if let Some(timeout) = config.tool_timeout {
            policy = policy.with_timeout(timeout);
        }

        info!(
            toolkits = selected.len(),
            tools = catalog.len(),
            disabled = config.disabled_tools.len(),
            "Tool catalog loaded"
        );

        Ok(Self::new(
            ToolExecutor::with_policy(catalog, policy),
            config.secret.clone(),
        ))
    }
}

/// Keep the named toolkits (case-insensitive), or all of them when no names are given.
pub fn select_toolkits(
    available: Vec<Toolkit>,
    names: Option<&[String]>,
) -> std::result::Result<Vec<Toolkit>, ConfigError> {
    let Some(names) = names else {
        return Ok(available);
    };

    if let Some(unknown) = names
        .iter()
        .find(|name| !available.iter().any(|t| t.name.eq_ignore_ascii_case(name)))
    {
        return Err(ConfigError::UnknownToolkit(unknown.clone()));
    }

    Ok(available
        .into_iter()
        .filter(|t| names.iter().any(|name| t.name.eq_ignore_ascii_case(name)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_toolkits() {
        let all = toolkits::all_toolkits();
        let count = all.len();

        let selected = select_toolkits(all.clone(), None).unwrap();
        assert_eq!(selected.len(), count);

        let names = vec!["math".to_string(), "ZOOM".to_string()];
        let selected = select_toolkits(all.clone(), Some(&names)).unwrap();
        let selected: Vec<&str> = selected.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(selected, vec!["Math", "Zoom"]);

        let names = vec!["Slack".to_string()];
        assert!(matches!(
            select_toolkits(all, Some(&names)),
            Err(ConfigError::UnknownToolkit(name)) if name == "Slack"
        ));
    }
}
