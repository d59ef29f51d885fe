//! Session lifecycle events
//!
//! Handlers report their own termination on a channel; the router listens
//! and is the only party that removes entries from the store.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::session::SessionId;
use crate::session::store::SessionStore;

/// Emitted by a protocol handler about its own session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session ended; it must leave the table and never come back.
    Closed { session_id: SessionId },
}

pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn channel() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::unbounded_channel()
}

/// Consumes session events until every sender is gone.
pub async fn run_close_listener(store: Arc<dyn SessionStore>, mut events: SessionEventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Closed { session_id } => match store.remove(&session_id).await {
                Ok(Some(session)) => {
                    info!(
                        "Session {} closed after {:?} ({} active)",
                        session_id,
                        session.age(),
                        store.len().await
                    );
                }
                Ok(None) => {
                    warn!("Close event for unknown session {}", session_id);
                }
                Err(e) => {
                    error!("Failed to remove session {}: {}", session_id, e);
                }
            },
        }
    }
    info!("Session event channel closed, listener stopping");
}
