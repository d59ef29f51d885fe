//! HTTP transport
//!
//! The per-session protocol handler contract and its streamable HTTP
//! implementation.

pub mod handler;
pub mod notifications;
pub mod streamable;

pub use handler::{HandlerFactory, HandlerOutcome, HandlerRequest, ProtocolHandler, SessionHeader};
pub use notifications::NotificationStream;
pub use streamable::{McpHandlerFactory, McpSessionHandler};
