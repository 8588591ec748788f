//! Toolkits group the tools of one vendor integration.

use std::sync::Arc;

use crate::schema::ToolkitDefinition;
use crate::tool::Tool;

/// A named, versioned set of tools.
#[derive(Clone)]
pub struct Toolkit {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl Toolkit {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: version.into(),
            tools: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn definition(&self) -> ToolkitDefinition {
        ToolkitDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            version: Some(self.version.clone()),
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("tools", &self.tool_names())
            .finish()
    }
}
