//! MCP protocol implementation
//!
//! JSON-RPC message handling, MCP payload types, initiation detection and
//! response shapes.

pub mod classifier;
pub mod dispatch;
pub mod jsonrpc;
pub mod mcp;
pub mod responses;

pub use classifier::{InitiationClassifier, McpInitializeClassifier};
pub use dispatch::{Dispatcher, Notifier};
pub use jsonrpc::{JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
