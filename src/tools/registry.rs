//! Tool registry
//!
//! Keeps tools in registration order and dispatches calls by name.

use serde_json::Value;

use crate::error::ToolError;
use crate::protocol::mcp::{CallToolResult, ToolDefinition};
use crate::tools::{RandomNumberTool, Tool};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RandomNumberTool);
        registry
    }

    /// Adds a tool, replacing any existing tool of the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.definition().name;
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(Box::new(tool));
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn call(&self, name: &str, arguments: Option<&Value>) -> Result<CallToolResult, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition().name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(arguments)
    }
}
