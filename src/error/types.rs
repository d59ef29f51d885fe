//! Error types
//!
//! Defines domain-specific error types for each module of the MCP server.

use std::io;

use crate::session::SessionId;

/// Protocol handler errors
///
/// Raised when a session handler cannot finish processing an exchange.
/// Protocol-level rejections (bad JSON, unknown method, ...) are not errors:
/// the handler answers them itself with a JSON-RPC error body.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Handler failure: {0}")]
    Handler(String),
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session already registered: {0}")]
    DuplicateSession(SessionId),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Tool invocation errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Startup and runtime errors of the server process
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to bind to {addr}: {source}")]
    Bind { addr: String, source: io::Error },
}
