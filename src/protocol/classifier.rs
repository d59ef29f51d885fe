//! Initiation classifier
//!
//! Decides whether a parsed POST body asks for a brand new session.

use serde_json::Value;

use crate::protocol::jsonrpc::JsonRpcMessage;
use crate::protocol::mcp::{InitializeParams, METHOD_INITIALIZE};

/// Answers "does this message request a new session".
pub trait InitiationClassifier: Send + Sync {
    fn is_initiation(&self, body: &Value) -> bool;
}

/// Recognises a single, well-formed MCP `initialize` request.
///
/// Batched bodies never count as initiation.
#[derive(Debug, Default, Clone, Copy)]
pub struct McpInitializeClassifier;

impl InitiationClassifier for McpInitializeClassifier {
    fn is_initiation(&self, body: &Value) -> bool {
        match JsonRpcMessage::from_value(body.clone()) {
            Some(JsonRpcMessage::Request(req)) if req.method == METHOD_INITIALIZE => req
                .params
                .is_some_and(|params| serde_json::from_value::<InitializeParams>(params).is_ok()),
            _ => false,
        }
    }
}
