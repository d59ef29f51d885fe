//! HTTP response builders
//!
//! The two session-routing rejection shapes and the JSON-RPC error bodies
//! returned by the protocol handler.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::protocol::jsonrpc::{JsonRpcError, JsonRpcResponse, SERVER_ERROR};
use crate::session::SessionId;

/// Header carrying the session identifier in both directions.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

pub const NO_VALID_SESSION_MESSAGE: &str = "Bad Request: No valid session ID provided";
pub const INVALID_OR_MISSING_SESSION_MESSAGE: &str = "Invalid or missing session ID";

/// POST without a usable session: structured JSON-RPC error, HTTP 400.
pub fn no_valid_session() -> Response {
    jsonrpc_error(
        StatusCode::BAD_REQUEST,
        JsonRpcError::new(SERVER_ERROR, NO_VALID_SESSION_MESSAGE),
    )
}

/// GET/DELETE without a usable session: plain text, HTTP 400.
pub fn invalid_or_missing_session() -> Response {
    (StatusCode::BAD_REQUEST, INVALID_OR_MISSING_SESSION_MESSAGE).into_response()
}

/// A JSON-RPC error with a `null` id at the given HTTP status.
pub fn jsonrpc_error(status: StatusCode, error: JsonRpcError) -> Response {
    (status, Json(JsonRpcResponse::failure(None, error))).into_response()
}

/// Stamps the session header onto an outgoing response.
pub fn with_session_header(mut response: Response, session_id: &SessionId) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id.as_str()) {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
    response
}
