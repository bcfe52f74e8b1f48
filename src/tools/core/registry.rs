use std::collections::HashMap;

use crate::config::ModuleFilter;
use crate::tools::core::dyn_tool::DynTool;

/// A tool definition as surfaced to the calling agent via `tools/list`.
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Central registry for the active tools, grouped by module.
///
/// Built once at startup from the full catalog and the module filter;
/// the handler receives it as an explicit dependency.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn DynTool>>,
    /// Module names in registration order, for logging.
    modules: Vec<&'static str>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            modules: Vec::new(),
        }
    }

    /// Build a registry containing every module the filter enables.
    pub fn with_enabled_modules(filter: &ModuleFilter) -> Self {
        let mut registry = Self::new();
        for (module, tools) in crate::tools::catalog() {
            if filter.is_enabled(module) {
                registry.register_module(module, tools);
            }
        }
        tracing::info!(
            "Registered {} tools across modules: {}",
            registry.tools.len(),
            registry.modules.join(", ")
        );
        registry
    }

    /// Register all tools of one module.
    pub fn register_module(&mut self, module: &'static str, tools: Vec<Box<dyn DynTool>>) {
        for tool in tools {
            let name = tool.spec().name;
            if self.tools.insert(name.to_string(), tool).is_some() {
                tracing::warn!("Tool '{}' registered twice; keeping the later one", name);
            }
        }
        self.modules.push(module);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Names of the modules whose tools are active.
    pub fn module_names(&self) -> &[&'static str] {
        &self.modules
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Tool definitions for `tools/list`, sorted by name for a stable
    /// listing.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| {
                let spec = tool.spec();
                ToolDefinition {
                    name: spec.name.to_string(),
                    description: spec.description.to_string(),
                    parameters: spec.parameters_schema.clone(),
                }
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_catalog_registers_every_module() {
        let registry = ToolRegistry::with_enabled_modules(&ModuleFilter::All);
        let modules = registry.module_names();
        for expected in [
            "github",
            "jira",
            "quip",
            "n8n",
            "pocketbase",
            "replicate",
            "slack",
            "telegram",
        ] {
            assert!(modules.contains(&expected), "missing module {expected}");
        }
        assert!(registry.get("github_get_pull_request").is_some());
        assert!(registry.get("telegram_send_message").is_some());
    }

    #[test]
    fn test_include_filter_limits_modules() {
        let filter = ModuleFilter::Include(vec!["slack".to_string()]);
        let registry = ToolRegistry::with_enabled_modules(&filter);
        assert_eq!(registry.module_names(), ["slack"]);
        assert!(registry.get("slack_send_message").is_some());
        assert!(registry.get("github_get_pull_request").is_none());
    }

    #[test]
    fn test_exclude_filter_drops_modules() {
        let filter = ModuleFilter::Exclude(vec!["pocketbase".to_string()]);
        let registry = ToolRegistry::with_enabled_modules(&filter);
        assert!(registry.get("pocketbase_list_collections").is_none());
        assert!(registry.get("jira_get_issue").is_some());
    }

    #[test]
    fn test_definitions_are_sorted_and_complete() {
        let registry = ToolRegistry::with_enabled_modules(&ModuleFilter::All);
        let definitions = registry.definitions();
        assert_eq!(definitions.len(), registry.count());
        for pair in definitions.windows(2) {
            assert!(pair[0].name < pair[1].name);
        }
        for definition in &definitions {
            assert!(!definition.description.is_empty());
            assert_eq!(definition.parameters["type"], "object");
        }
    }
}
