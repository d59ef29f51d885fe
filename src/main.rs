//! RAX MCP Server - Entry Point
//!
//! Serves the `random_number` tool over MCP streamable HTTP.

use log::info;

use rax_mcp_server::error::ServerError;
use rax_mcp_server::utils::setup_logging;
use rax_mcp_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    setup_logging();

    let config = ServerConfig::load()?;
    info!("Launching MCP server on {}...", config.socket_address());

    let server = Server::bind(config).await?;
    server.run().await
}
