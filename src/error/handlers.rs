//! Error handlers
//!
//! Turns failures the router cannot recover from into HTTP responses.

use axum::http::StatusCode;
use axum::response::Response;
use log::error;

use crate::error::types::{ProtocolError, SessionError};
use crate::protocol::jsonrpc::{INTERNAL_ERROR, JsonRpcError};
use crate::protocol::responses::jsonrpc_error;

/// Log a handler failure
pub fn handle_error(err: &ProtocolError) {
    error!("Protocol handler error: {}", err);
}

/// HTTP status for each failure kind
pub fn error_to_http_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::DuplicateSession(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// A handler failed mid-request: answer this request only.
pub fn protocol_error_response(err: &ProtocolError) -> Response {
    handle_error(err);
    jsonrpc_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        JsonRpcError::new(INTERNAL_ERROR, "Internal server error"),
    )
}

/// The session store failed.
pub fn session_error_response(err: &SessionError) -> Response {
    error!("Session store error: {}", err);
    jsonrpc_error(
        error_to_http_status(err),
        JsonRpcError::new(INTERNAL_ERROR, "Internal server error"),
    )
}
