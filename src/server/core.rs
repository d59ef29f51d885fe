use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::{Dispatcher, McpInitializeClassifier};
use crate::server::routes::{self, AppState};
use crate::session::{InMemorySessionStore, SessionRouter, UuidGenerator};
use crate::transport::McpHandlerFactory;

pub struct Server {
    listener: TcpListener,
    app: Router,
    config: ServerConfig,
}

impl Server {
    /// Binds the listener and assembles the application.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.socket_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", addr);

        Ok(Self {
            listener,
            app: build_app(&config),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(
            "MCP endpoint listening on http://{}{}",
            self.local_addr()?,
            self.config.endpoint_path
        );

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Wires the session router with the MCP handler factory, the initialize
/// classifier, the in-memory store and random ids.
///
/// Must be called from within a Tokio runtime.
pub fn build_app(config: &ServerConfig) -> Router {
    let factory = McpHandlerFactory::new(
        Arc::new(Dispatcher::with_defaults()),
        config.sse_keep_alive(),
    );
    let router = SessionRouter::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(factory),
        Arc::new(McpInitializeClassifier),
        Arc::new(UuidGenerator),
    );
    routes::build(&config.endpoint_path, AppState::new(router))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
