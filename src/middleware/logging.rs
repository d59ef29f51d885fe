//! Logging middleware
//!
//! Logs every HTTP exchange on the MCP endpoint with its outcome.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};

use crate::protocol::responses::SESSION_ID_HEADER;

/// Log one request: method, path, session header, status and latency.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let session = request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        warn!(
            "{} {} session={} -> {} in {:?}",
            method,
            path,
            session,
            status,
            started.elapsed()
        );
    } else {
        info!(
            "{} {} session={} -> {} in {:?}",
            method,
            path,
            session,
            status,
            started.elapsed()
        );
    }
    response
}
