//! Session identifiers
//!
//! Opaque, server-generated tokens naming one session.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Opaque session identifier.
///
/// The router never interprets the contents; it only compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Produces fresh session identifiers.
pub trait SessionIdGenerator: Send + Sync {
    fn generate(&self) -> SessionId;
}

/// Random 128-bit identifiers (UUID v4).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl SessionIdGenerator for UuidGenerator {
    fn generate(&self) -> SessionId {
        SessionId(Uuid::new_v4().to_string())
    }
}

pub type SharedIdGenerator = Arc<dyn SessionIdGenerator>;
