//! Server core functionality
//!
//! The HTTP listener, the endpoint routes and the shared application state.

pub mod core;
pub mod routes;

pub use core::{Server, build_app};
pub use routes::AppState;
