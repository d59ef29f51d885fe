//! Tools
//!
//! The callable capabilities exposed through `tools/list` and `tools/call`.

pub mod random;
pub mod registry;

use serde_json::Value;

use crate::error::ToolError;
use crate::protocol::mcp::{CallToolResult, ToolDefinition};

pub use random::RandomNumberTool;
pub use registry::ToolRegistry;

/// A tool the server can run on a client's behalf.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn call(&self, arguments: Option<&Value>) -> Result<CallToolResult, ToolError>;
}
