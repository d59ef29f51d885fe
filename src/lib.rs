pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;
pub mod utils;

pub use config::ServerConfig;
pub use server::{Server, build_app};
