//! Tool catalog: definitions plus the tools that implement them.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::schema::{
    FullyQualifiedName, InputParameter, ToolDefinition, ToolInput, ToolkitDefinition,
    DEFAULT_DESCRIPTION,
};
use crate::tool::Tool;
use crate::toolkit::Toolkit;

/// A tool together with its validated definition.
#[derive(Clone)]
pub struct CatalogEntry {
    pub definition: ToolDefinition,
    pub tool: Arc<dyn Tool>,
}

impl CatalogEntry {
    pub fn fully_qualified_name(&self) -> &FullyQualifiedName {
        &self.definition.fully_qualified_name
    }
}

/// Catalog of tools keyed by fully qualified name.
///
/// Entries are kept in registration order. Lookups ignore case and accept
/// either `Toolkit.Tool` or, when it is unambiguous, the bare tool name.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: IndexMap<String, CatalogEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate the definition of `tool` as a member of `toolkit`.
    pub fn create_tool_definition(
        tool: &dyn Tool,
        toolkit: &ToolkitDefinition,
    ) -> Result<ToolDefinition, ToolError> {
        let description = match tool.description().trim() {
            "" => DEFAULT_DESCRIPTION.to_string(),
            text => text.to_string(),
        };

        let parameters = tool
            .parameters()
            .into_iter()
            .map(|param| InputParameter {
                description: Some(
                    param
                        .description
                        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                ),
                ..param
            })
            .collect();

        let definition = ToolDefinition {
            name: tool.name().to_string(),
            fully_qualified_name: FullyQualifiedName::new(&toolkit.name, tool.name()),
            description,
            toolkit: toolkit.clone(),
            input: ToolInput { parameters },
            output: tool.output(),
            requirements: tool.requirements(),
            deprecation_message: tool.deprecation_message().map(str::to_string),
        };

        definition.validate()?;
        Ok(definition)
    }

    /// Add a single tool. A tool with the same qualified name is replaced.
    pub fn add_tool(
        &mut self,
        tool: Arc<dyn Tool>,
        toolkit: &ToolkitDefinition,
    ) -> Result<(), ToolError> {
        let definition = Self::create_tool_definition(tool.as_ref(), toolkit)?;
        let fqn = definition.fully_qualified_name.clone();
        let key = fqn.key();

        if self.tools.contains_key(&key) {
            warn!("Replacing already registered tool: {}", fqn);
        } else {
            debug!("Registering tool: {}", fqn);
        }

        self.tools.insert(key, CatalogEntry { definition, tool });
        Ok(())
    }

    /// Add every tool of a toolkit.
    pub fn add_toolkit(&mut self, toolkit: &Toolkit) -> Result<(), ToolError> {
        let definition = toolkit.definition();
        for tool in &toolkit.tools {
            self.add_tool(Arc::clone(tool), &definition)?;
        }
        info!(
            "Registered toolkit {} v{} ({} tools)",
            toolkit.name,
            toolkit.version,
            toolkit.tools.len()
        );
        Ok(())
    }

    /// Look up by `Toolkit.Tool` or by bare tool name when only one toolkit has it.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        if let Ok(fqn) = name.parse::<FullyQualifiedName>() {
            if let Some(entry) = self.tools.get(&fqn.key()) {
                return Some(entry);
            }
        }

        let mut matches = self
            .tools
            .values()
            .filter(|entry| entry.definition.name.eq_ignore_ascii_case(name));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.values().map(|e| &e.definition).collect()
    }

    /// Fully qualified names, in registration order.
    pub fn list_tools(&self) -> Vec<String> {
        self.tools
            .values()
            .map(|e| e.definition.fully_qualified_name.to_string())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ToolContext;
    use crate::function_tool::FunctionTool;
    use crate::param::Param;
    use crate::tool::ToolArgs;
    use async_trait::async_trait;
    use serde_json::Value;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        fn parameters(&self) -> Vec<InputParameter> {
            vec![Param::undocumented::<String>("message")]
        }

        async fn execute(&self, _ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
            Ok(Value::String(args.get_string("message")?))
        }
    }

    fn toolkit(name: &str) -> ToolkitDefinition {
        ToolkitDefinition {
            name: name.to_string(),
            description: None,
            version: Some("0.1.0".to_string()),
        }
    }

    #[test]
    fn test_create_definition_fills_descriptions() {
        let def = ToolCatalog::create_tool_definition(&EchoTool, &toolkit("Utils")).unwrap();
        assert_eq!(def.fully_qualified_name.to_string(), "Utils.Echo");
        assert_eq!(
            def.input.parameters[0].description.as_deref(),
            Some(DEFAULT_DESCRIPTION)
        );
    }

    #[test]
    fn test_invalid_tool_is_rejected() {
        let tool = FunctionTool::builder("bad name").handler(|_ctx, _args| async { Ok(()) });
        let mut catalog = ToolCatalog::new();
        let err = catalog.add_tool(Arc::new(tool), &toolkit("Utils")).unwrap_err();
        assert!(matches!(err, ToolError::Definition { .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_lookup() {
        let mut catalog = ToolCatalog::new();
        catalog.add_tool(Arc::new(EchoTool), &toolkit("Utils")).unwrap();

        assert!(catalog.has_tool("Utils.Echo"));
        assert!(catalog.has_tool("utils.echo"));
        assert!(catalog.has_tool("Echo"));
        assert!(!catalog.has_tool("Other.Echo"));
        assert!(!catalog.has_tool("nonexistent"));
    }

    #[test]
    fn test_bare_name_must_be_unique() {
        let mut catalog = ToolCatalog::new();
        catalog.add_tool(Arc::new(EchoTool), &toolkit("Utils")).unwrap();
        catalog.add_tool(Arc::new(EchoTool), &toolkit("Other")).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("Echo").is_none());
        assert!(catalog.get("Other.Echo").is_some());
    }

    #[test]
    fn test_duplicate_replaces() {
        let mut catalog = ToolCatalog::new();
        catalog.add_tool(Arc::new(EchoTool), &toolkit("Utils")).unwrap();
        catalog.add_tool(Arc::new(EchoTool), &toolkit("utils")).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.list_tools(), vec!["utils.Echo".to_string()]);
    }

    #[test]
    fn test_add_toolkit_keeps_order() {
        let kit = Toolkit::new("Utils", "1.0.0")
            .tool(EchoTool)
            .tool(FunctionTool::builder("Ping").handler(|_ctx, _args| async { Ok("pong") }));
        let mut catalog = ToolCatalog::new();
        catalog.add_toolkit(&kit).unwrap();

        assert_eq!(
            catalog.list_tools(),
            vec!["Utils.Echo".to_string(), "Utils.Ping".to_string()]
        );
        let versions: Vec<_> = catalog
            .definitions()
            .iter()
            .map(|d| d.toolkit.version.clone())
            .collect();
        assert_eq!(versions, vec![Some("1.0.0".to_string()); 2]);
    }
}
