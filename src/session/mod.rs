//! Session management
//!
//! Session identifiers, lifecycle state, the session table and the router
//! that owns it.

pub mod events;
pub mod id;
pub mod router;
pub mod state;
pub mod store;

pub use events::{SessionEvent, SessionEventSender};
pub use id::{SessionId, SessionIdGenerator, SharedIdGenerator, UuidGenerator};
pub use router::{Disposition, SessionRouter};
pub use state::SessionState;
pub use store::{InMemorySessionStore, Session, SessionStore};
