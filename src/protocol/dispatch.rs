//! Method dispatch
//!
//! Routes JSON-RPC requests and notifications of an initialized session to
//! their handlers.

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::protocol::jsonrpc::{
    INTERNAL_ERROR, INVALID_REQUEST, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse,
};
use crate::protocol::mcp::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, ListToolsResult,
    METHOD_INITIALIZE, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIFICATION_PROGRESS,
    ServerCapabilities, ToolsCapability, negotiate_protocol_version,
};
use crate::tools::ToolRegistry;

/// Delivers server-initiated notifications to the client of one session.
pub trait Notifier {
    /// Returns `false` when nobody is listening.
    fn notify(&self, notification: JsonRpcNotification) -> bool;
}

/// Stateless method table shared by every session.
pub struct Dispatcher {
    server_info: Implementation,
    tools: ToolRegistry,
}

impl Dispatcher {
    pub fn new(server_info: Implementation, tools: ToolRegistry) -> Self {
        Self { server_info, tools }
    }

    /// Dispatcher named after this crate, with the built-in tools.
    pub fn with_defaults() -> Self {
        Self::new(
            Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            ToolRegistry::with_defaults(),
        )
    }

    /// Answers an `initialize` request.
    pub fn initialize(&self, request: &JsonRpcRequest) -> Result<InitializeResult, JsonRpcError> {
        let params: InitializeParams = parse_params(request.params.as_ref())?;
        debug!(
            "Initialize from {} {} (protocol {})",
            params.client_info.name, params.client_info.version, params.protocol_version
        );

        Ok(InitializeResult {
            protocol_version: negotiate_protocol_version(&params.protocol_version).to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.server_info.clone(),
        })
    }

    /// Handles one request of an initialized session.
    pub fn handle_request(&self, request: JsonRpcRequest, notifier: &dyn Notifier) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            METHOD_PING => Ok(json!({})),
            METHOD_TOOLS_LIST => to_result(ListToolsResult {
                tools: self.tools.list(),
            }),
            METHOD_TOOLS_CALL => self.handle_tools_call(request.params.as_ref(), notifier),
            METHOD_INITIALIZE => Err(JsonRpcError::new(
                INVALID_REQUEST,
                "Invalid Request: Server already initialized",
            )),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::failure(Some(request.id), error),
        }
    }

    pub fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => debug!("Client finished initialization"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification {}", other),
        }
    }

    fn handle_tools_call(
        &self,
        params: Option<&Value>,
        notifier: &dyn Notifier,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        let progress_token = params.meta.and_then(|meta| meta.progress_token);

        let result = self
            .tools
            .call(&params.name, params.arguments.as_ref())
            .map_err(|e: ToolError| JsonRpcError::invalid_params(e.to_string()))?;

        if let Some(token) = progress_token {
            let delivered = notifier.notify(JsonRpcNotification::new(
                NOTIFICATION_PROGRESS,
                Some(json!({"progressToken": token, "progress": 1, "total": 1})),
            ));
            if !delivered {
                debug!("No notification stream open for progress of {}", params.name);
            }
        }

        to_result(result)
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, JsonRpcError> {
    let params = params.cloned().unwrap_or(Value::Null);
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
}

fn to_result<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        warn!("Failed to serialize result: {}", e);
        JsonRpcError::new(INTERNAL_ERROR, "Internal error")
    })
}
