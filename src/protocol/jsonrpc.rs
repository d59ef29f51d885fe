//! Module `jsonrpc`
//!
//! JSON-RPC 2.0 message types and the parser that turns a POST body into a
//! list of messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Implementation-defined server error codes
pub const SERVER_ERROR: i64 = -32000;
pub const SESSION_NOT_FOUND: i64 = -32001;

/// JSON-RPC request id, either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC notification (no id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response. `id` serializes as `null` when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

/// A single inbound JSON-RPC message.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// Reply from the client to a server-initiated request.
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Classifies a JSON value as a request, notification or response.
    ///
    /// Returns `None` for anything that is not a well-formed JSON-RPC 2.0
    /// message.
    pub fn from_value(value: Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return None;
        }

        let has_id = object.get("id").is_some_and(|id| !id.is_null());
        if object.contains_key("method") {
            if has_id {
                serde_json::from_value(value).ok().map(Self::Request)
            } else {
                serde_json::from_value(value).ok().map(Self::Notification)
            }
        } else if object.contains_key("result") || object.contains_key("error") {
            serde_json::from_value(value).ok().map(Self::Response)
        } else {
            None
        }
    }
}

/// A POST body: one message or a batch.
#[derive(Debug, Clone)]
pub struct MessageBatch {
    pub messages: Vec<JsonRpcMessage>,
    pub is_batch: bool,
}

/// Parses a raw JSON value into a message batch.
///
/// Empty arrays and arrays containing any malformed element are rejected.
pub fn parse_messages(value: &Value) -> Option<MessageBatch> {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let messages = items
                .iter()
                .cloned()
                .map(JsonRpcMessage::from_value)
                .collect::<Option<Vec<_>>>()?;
            Some(MessageBatch {
                messages,
                is_batch: true,
            })
        }
        Value::Object(_) => Some(MessageBatch {
            messages: vec![JsonRpcMessage::from_value(value.clone())?],
            is_batch: false,
        }),
        _ => None,
    }
}
