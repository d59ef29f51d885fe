//! Session store
//!
//! Maps session identifiers to live sessions. Only the session router
//! writes to a store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SessionError;
use crate::session::SessionId;
use crate::transport::ProtocolHandler;

/// One live session: its id and the handler that owns its protocol state.
pub struct Session {
    id: SessionId,
    handler: Arc<dyn ProtocolHandler>,
    created_at: Instant,
}

impl Session {
    pub fn new(id: SessionId, handler: Arc<dyn ProtocolHandler>) -> Self {
        Self {
            id,
            handler,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn handler(&self) -> &Arc<dyn ProtocolHandler> {
        &self.handler
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Backing storage for the session table.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Adds a session. Fails if the id is already present.
    async fn insert(&self, session: Session) -> Result<(), SessionError>;

    async fn get(&self, id: &SessionId) -> Result<Option<Arc<Session>>, SessionError>;

    async fn remove(&self, id: &SessionId) -> Result<Option<Arc<Session>>, SessionError>;

    async fn len(&self) -> usize;
}

/// Process-local session table.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(SessionError::DuplicateSession(session.id().clone()));
        }
        sessions.insert(session.id().clone(), Arc::new(session));
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Arc<Session>>, SessionError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &SessionId) -> Result<Option<Arc<Session>>, SessionError> {
        Ok(self.sessions.write().await.remove(id))
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
