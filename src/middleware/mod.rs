//! Server middleware
//!
//! Request logging for the HTTP endpoint.

pub mod logging;

pub use logging::log_request;
