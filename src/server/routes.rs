//! Endpoint routes
//!
//! POST, GET and DELETE on the MCP endpoint, all delegated to the session
//! router. Axum answers every other verb with 405.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use axum::middleware;
use axum::response::Response;
use axum::routing::post;
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::ProtocolError;
use crate::error::handlers::protocol_error_response;
use crate::middleware::log_request;
use crate::session::SessionRouter;
use crate::transport::HandlerRequest;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SessionRouter>,
}

impl AppState {
    pub fn new(router: SessionRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// Build the endpoint router at `path`.
pub fn build(path: &str, state: AppState) -> Router {
    Router::new()
        .route(
            path,
            post(handle_post)
                .get(handle_session_request)
                .delete(handle_session_request),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    state
        .router
        .handle_post(HandlerRequest::with_body(Method::POST, headers, body))
        .await
}

async fn handle_session_request(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    state
        .router
        .handle_session_request(HandlerRequest::without_body(method, headers))
        .await
}

/// A panicking handler fails its own request only.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    protocol_error_response(&ProtocolError::Handler(format!("panicked: {detail}")))
}
