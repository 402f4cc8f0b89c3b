//! Shared test utilities for gridlock-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridlock_core::{Board, GameConfig, MemoryResultStore, MoveStrategy, Symbol};
use gridlock_server::{AppState, GridlockServer, ServerConfig};
use tokio::net::TcpListener;

/// Bot that always plays the leftmost open column
pub struct LeftmostBot;

impl MoveStrategy for LeftmostBot {
    fn choose_move(&self, board: &Board, _symbol: Symbol) -> Option<usize> {
        board.legal_columns().next()
    }
}

/// Game timings shrunk so tests finish quickly
pub fn fast_config() -> GameConfig {
    GameConfig {
        tick_interval: Duration::from_millis(20),
        bot_wait_threshold: Duration::from_millis(200),
        forfeit_grace: Duration::from_millis(300),
        bot_think_delay: Duration::from_millis(20),
        ..GameConfig::default()
    }
}

/// Creates a test server with fast timings, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    create_test_server_with_config(fast_config()).await
}

/// Creates a test server with custom game config
#[allow(dead_code)]
pub async fn create_test_server_with_config(config: GameConfig) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::with_components(
        config,
        Arc::new(MemoryResultStore::new()),
        Arc::new(LeftmostBot),
    ));

    let server = GridlockServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: GridlockServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}
