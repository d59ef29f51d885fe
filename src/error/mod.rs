//! Error handling
//!
//! Defines error types and handling for the MCP server.

pub mod handlers;
pub mod types;

pub use types::*;
