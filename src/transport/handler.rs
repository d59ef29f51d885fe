//! Protocol handler contract
//!
//! What the session router needs from the per-session protocol machinery:
//! construction, request delegation, and a way to learn the confirmed id.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::responses::SESSION_ID_HEADER;
use crate::session::{SessionEventSender, SessionId, SharedIdGenerator};

/// The session id header as the client sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHeader<'a> {
    Absent,
    Present(&'a str),
    /// Sent, but not visible ASCII; it can never name a session.
    Unreadable,
}

/// One HTTP exchange handed to a protocol handler.
#[derive(Debug)]
pub struct HandlerRequest {
    pub method: Method,
    pub headers: HeaderMap,
    /// The body parsed as JSON; `None` when it does not parse or on the
    /// GET/DELETE path.
    pub parsed_body: Option<Value>,
}

impl HandlerRequest {
    pub fn with_body(method: Method, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            headers,
            parsed_body: serde_json::from_slice(&body).ok(),
        }
    }

    pub fn without_body(method: Method, headers: HeaderMap) -> Self {
        Self {
            method,
            headers,
            parsed_body: None,
        }
    }

    pub fn session_header(&self) -> SessionHeader<'_> {
        match self.headers.get(SESSION_ID_HEADER) {
            None => SessionHeader::Absent,
            Some(value) => value
                .to_str()
                .map_or(SessionHeader::Unreadable, SessionHeader::Present),
        }
    }

    /// Drops the body, keeping method and headers.
    pub fn into_bodyless(self) -> Self {
        Self::without_body(self.method, self.headers)
    }
}

/// Result of one delegated exchange.
#[derive(Debug)]
pub struct HandlerOutcome {
    pub response: Response,
    /// Set exactly when this exchange finalized a new session id.
    pub confirmed_session: Option<SessionId>,
}

impl HandlerOutcome {
    pub fn respond(response: Response) -> Self {
        Self {
            response,
            confirmed_session: None,
        }
    }

    pub fn confirmed(response: Response, session_id: SessionId) -> Self {
        Self {
            response,
            confirmed_session: Some(session_id),
        }
    }
}

/// Per-session protocol state machine.
///
/// A handler signals its own termination by sending
/// [`SessionEvent::Closed`](crate::session::SessionEvent) on the sender it
/// was built with, at most once.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    fn is_closed(&self) -> bool;

    async fn handle_request(&self, request: HandlerRequest)
    -> Result<HandlerOutcome, ProtocolError>;
}

/// Builds a fresh handler for a session-initiation request.
pub trait HandlerFactory: Send + Sync {
    fn create(
        &self,
        ids: SharedIdGenerator,
        events: SessionEventSender,
    ) -> Arc<dyn ProtocolHandler>;
}
