//! gridlock-server - HTTP and WebSocket transport for gridlock
//!
//! This crate owns the [`Hub`](gridlock_core::Hub) through [`AppState`] and
//! exposes it over a WebSocket game endpoint plus a small JSON API for
//! health, leaderboard, and statistics.

mod error;
pub mod http;
mod state;
pub mod ws;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// Default port the server listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The main gridlock server
pub struct GridlockServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl GridlockServer {
    /// Create a new server with default state
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new()),
        }
    }

    /// Create a server with custom state
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("gridlock server listening on {}", addr);

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let tasks = self.state.start_background_tasks();

        let router = create_router(Arc::clone(&self.state));
        let result = axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        for task in tasks {
            task.abort();
        }
        result
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:8080")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
