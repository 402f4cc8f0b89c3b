//! Gridlock serve command
//!
//! Runs the game server:
//! - WebSocket endpoint for matchmaking and play
//! - HTTP API for health, leaderboard, and statistics

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use gridlock_server::{AppState, GridlockServer, ServerConfig};
use tracing::info;

use super::open_store;
use crate::config::{ConfigLoader, GridlockConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Database file for finished games (`:memory:` for none)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Seconds a lone player waits before being matched with the bot
    #[arg(long)]
    pub bot_wait: Option<u64>,

    /// Seconds a disconnected player has to rejoin
    #[arg(long)]
    pub forfeit_grace: Option<u64>,
}

impl ServeArgs {
    /// Command-line flags are the last configuration layer
    pub fn apply(&self, config: &mut GridlockConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.storage.database = database.to_string_lossy().into_owned();
            config.storage.remote_url = None;
        }
        if let Some(secs) = self.bot_wait {
            config.game.bot_wait_secs = secs;
        }
        if let Some(secs) = self.forfeit_grace {
            config.game.forfeit_grace_secs = secs;
        }
    }
}

/// Run the server in the foreground until it stops
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    args.apply(&mut config);

    let store = open_store(&config.storage).await?;
    let state = AppState::with_store(config.game.to_game_config(), Arc::new(store));
    let server_config = ServerConfig::new(config.server.host.clone(), config.server.port);

    info!("Starting gridlock server on {}", server_config.addr());
    info!(
        bot_wait_secs = config.game.bot_wait_secs,
        forfeit_grace_secs = config.game.forfeit_grace_secs,
        "Game settings"
    );

    GridlockServer::with_state(server_config, Arc::new(state))
        .run()
        .await?;
    Ok(())
}
