//! Streamable HTTP session handler
//!
//! Server side of one MCP session over HTTP: POST carries client messages
//! and gets JSON replies, GET opens the notification stream, DELETE ends
//! the session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::http::header::{ACCEPT, ALLOW, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use log::{debug, info, warn};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::ProtocolError;
use crate::protocol::jsonrpc::{
    INVALID_REQUEST, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, PARSE_ERROR,
    SERVER_ERROR, SESSION_NOT_FOUND, parse_messages,
};
use crate::protocol::mcp::METHOD_INITIALIZE;
use crate::protocol::responses::{jsonrpc_error, with_session_header};
use crate::protocol::Dispatcher;
use crate::session::{SessionEvent, SessionEventSender, SessionId, SessionState, SharedIdGenerator};
use crate::transport::notifications::{NotificationStream, StreamConflict};
use crate::transport::{
    HandlerFactory, HandlerOutcome, HandlerRequest, ProtocolHandler, SessionHeader,
};

const JSON_MEDIA_TYPE: &str = "application/json";
const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

pub struct McpSessionHandler {
    state: Mutex<SessionState>,
    ids: SharedIdGenerator,
    events: SessionEventSender,
    dispatcher: Arc<Dispatcher>,
    notifications: NotificationStream,
    keep_alive: Duration,
}

impl McpSessionHandler {
    pub fn new(
        ids: SharedIdGenerator,
        events: SessionEventSender,
        dispatcher: Arc<Dispatcher>,
        keep_alive: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::Uninitialized),
            ids,
            events,
            dispatcher,
            notifications: NotificationStream::new(),
            keep_alive,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ends the session. The close event is emitted on the first call only.
    pub fn close(&self) {
        let closed = self.state().close();
        if let Some(session_id) = closed {
            self.notifications.close();
            info!("Session {} terminated", session_id);
            if self
                .events
                .send(SessionEvent::Closed { session_id })
                .is_err()
            {
                warn!("Session event listener is gone; close not delivered");
            }
        }
    }

    /// The id of an active session, or the response explaining why there is
    /// none.
    fn active_session(&self, request: &HandlerRequest) -> Result<SessionId, Response> {
        let session_id = match self.state().clone() {
            SessionState::Active(id) => id,
            SessionState::Uninitialized => {
                return Err(rpc_error(
                    StatusCode::BAD_REQUEST,
                    SERVER_ERROR,
                    "Bad Request: Server not initialized",
                ));
            }
            SessionState::Closed(_) => return Err(session_not_found()),
        };

        match request.session_header() {
            SessionHeader::Present(header) if header == session_id.as_str() => Ok(session_id),
            SessionHeader::Present(_) | SessionHeader::Unreadable => Err(session_not_found()),
            SessionHeader::Absent => Err(rpc_error(
                StatusCode::BAD_REQUEST,
                SERVER_ERROR,
                "Bad Request: Mcp-Session-Id header is required",
            )),
        }
    }

    fn handle_post(&self, request: HandlerRequest) -> Result<HandlerOutcome, ProtocolError> {
        if self.is_closed() {
            return Ok(HandlerOutcome::respond(session_not_found()));
        }
        if !accept_header(&request.headers).is_none_or(|accept| lists(accept, JSON_MEDIA_TYPE)) {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::NOT_ACCEPTABLE,
                SERVER_ERROR,
                "Not Acceptable: Client must accept application/json",
            )));
        }
        if !content_type_is_json(&request.headers) {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                SERVER_ERROR,
                "Unsupported Media Type: Content-Type must be application/json",
            )));
        }

        let Some(body) = request.parsed_body.as_ref() else {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::BAD_REQUEST,
                PARSE_ERROR,
                "Parse error: Invalid JSON",
            )));
        };
        let Some(batch) = parse_messages(body) else {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                "Invalid Request: Invalid JSON-RPC message",
            )));
        };

        let initialize = batch.messages.iter().find_map(|message| match message {
            JsonRpcMessage::Request(req) if req.method == METHOD_INITIALIZE => Some(req),
            _ => None,
        });
        if let Some(initialize) = initialize {
            if self.state().session_id().is_some() {
                return Ok(HandlerOutcome::respond(rpc_error(
                    StatusCode::BAD_REQUEST,
                    INVALID_REQUEST,
                    "Invalid Request: Server already initialized",
                )));
            }
            if batch.messages.len() > 1 {
                return Ok(HandlerOutcome::respond(rpc_error(
                    StatusCode::BAD_REQUEST,
                    INVALID_REQUEST,
                    "Invalid Request: Only one initialization request is allowed",
                )));
            }
            return self.initialize(initialize);
        }

        let session_id = match self.active_session(&request) {
            Ok(id) => id,
            Err(response) => return Ok(HandlerOutcome::respond(response)),
        };

        let mut replies = Vec::new();
        for message in batch.messages {
            match message {
                JsonRpcMessage::Request(req) => {
                    debug!("Session {} request {}", session_id, req.method);
                    replies.push(self.dispatcher.handle_request(req, &self.notifications));
                }
                JsonRpcMessage::Notification(note) => self.dispatcher.handle_notification(&note),
                JsonRpcMessage::Response(_) => debug!("Session {} ignoring client response", session_id),
            }
        }

        if replies.is_empty() {
            return Ok(HandlerOutcome::respond(with_session_header(
                StatusCode::ACCEPTED.into_response(),
                &session_id,
            )));
        }

        let body = if batch.is_batch {
            serde_json::to_value(&replies)?
        } else {
            serde_json::to_value(&replies[0])?
        };
        Ok(HandlerOutcome::respond(with_session_header(
            (StatusCode::OK, Json(body)).into_response(),
            &session_id,
        )))
    }

    fn initialize(&self, request: &JsonRpcRequest) -> Result<HandlerOutcome, ProtocolError> {
        let result = match self.dispatcher.initialize(request) {
            Ok(result) => result,
            Err(error) => {
                let reply = JsonRpcResponse::failure(Some(request.id.clone()), error);
                return Ok(HandlerOutcome::respond(
                    (StatusCode::BAD_REQUEST, Json(reply)).into_response(),
                ));
            }
        };
        let reply = JsonRpcResponse::success(request.id.clone(), serde_json::to_value(result)?);

        let session_id = self.ids.generate();
        if !self.state().activate(session_id.clone()) {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                "Invalid Request: Server already initialized",
            )));
        }

        let response = with_session_header((StatusCode::OK, Json(reply)).into_response(), &session_id);
        Ok(HandlerOutcome::confirmed(response, session_id))
    }

    fn handle_get(&self, request: HandlerRequest) -> Result<HandlerOutcome, ProtocolError> {
        let session_id = match self.active_session(&request) {
            Ok(id) => id,
            Err(response) => return Ok(HandlerOutcome::respond(response)),
        };
        if !accept_header(&request.headers).is_some_and(|accept| lists(accept, EVENT_STREAM_MEDIA_TYPE)) {
            return Ok(HandlerOutcome::respond(rpc_error(
                StatusCode::NOT_ACCEPTABLE,
                SERVER_ERROR,
                "Not Acceptable: Client must accept text/event-stream",
            )));
        }

        let receiver = match self.notifications.open() {
            Ok(receiver) => receiver,
            Err(StreamConflict) => {
                return Ok(HandlerOutcome::respond(rpc_error(
                    StatusCode::CONFLICT,
                    SERVER_ERROR,
                    "Conflict: Only one SSE stream is allowed per session",
                )));
            }
        };
        debug!("Session {} opened notification stream", session_id);

        let events = UnboundedReceiverStream::new(receiver)
            .map(|notification| Event::default().event("message").json_data(notification));
        let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(self.keep_alive));

        Ok(HandlerOutcome::respond(with_session_header(
            sse.into_response(),
            &session_id,
        )))
    }

    fn handle_delete(&self, request: HandlerRequest) -> Result<HandlerOutcome, ProtocolError> {
        let session_id = match self.active_session(&request) {
            Ok(id) => id,
            Err(response) => return Ok(HandlerOutcome::respond(response)),
        };
        self.close();
        Ok(HandlerOutcome::respond(with_session_header(
            StatusCode::OK.into_response(),
            &session_id,
        )))
    }
}

#[async_trait]
impl ProtocolHandler for McpSessionHandler {
    fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    async fn handle_request(
        &self,
        request: HandlerRequest,
    ) -> Result<HandlerOutcome, ProtocolError> {
        match request.method {
            Method::POST => self.handle_post(request),
            Method::GET => self.handle_get(request),
            Method::DELETE => self.handle_delete(request),
            _ => {
                let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("GET, POST, DELETE"));
                Ok(HandlerOutcome::respond(response))
            }
        }
    }
}

/// Builds [`McpSessionHandler`]s sharing one dispatcher.
pub struct McpHandlerFactory {
    dispatcher: Arc<Dispatcher>,
    keep_alive: Duration,
}

impl McpHandlerFactory {
    pub fn new(dispatcher: Arc<Dispatcher>, keep_alive: Duration) -> Self {
        Self {
            dispatcher,
            keep_alive,
        }
    }
}

impl HandlerFactory for McpHandlerFactory {
    fn create(
        &self,
        ids: SharedIdGenerator,
        events: SessionEventSender,
    ) -> Arc<dyn ProtocolHandler> {
        Arc::new(McpSessionHandler::new(
            ids,
            events,
            Arc::clone(&self.dispatcher),
            self.keep_alive,
        ))
    }
}

fn rpc_error(status: StatusCode, code: i64, message: &str) -> Response {
    jsonrpc_error(status, JsonRpcError::new(code, message))
}

fn session_not_found() -> Response {
    rpc_error(StatusCode::NOT_FOUND, SESSION_NOT_FOUND, "Session not found")
}

fn accept_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACCEPT).and_then(|value| value.to_str().ok())
}

/// Whether an Accept value lists `media_type` or a matching wildcard.
fn lists(accept: &str, media_type: &str) -> bool {
    let wildcard = media_type
        .split_once('/')
        .map(|(kind, _)| format!("{kind}/*"))
        .unwrap_or_default();
    accept
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .any(|listed| listed == media_type || listed == "*/*" || listed == wildcard)
}

fn content_type_is_json(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) {
        Some(content_type) => content_type
            .split(';')
            .next()
            .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE)),
        None => true,
    }
}
