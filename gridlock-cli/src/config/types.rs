use std::time::Duration;

use gridlock_core::GameConfig;
use gridlock_core::config::{
    DEFAULT_BOT_NAME, DEFAULT_BOT_THINK_DELAY, DEFAULT_BOT_WAIT_THRESHOLD, DEFAULT_FORFEIT_GRACE,
    DEFAULT_LEADERBOARD_LIMIT, DEFAULT_TICK_INTERVAL,
};
use serde::{Deserialize, Serialize};

/// Default host for the gridlock server
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the gridlock server
pub const DEFAULT_PORT: u16 = gridlock_server::DEFAULT_PORT;
/// Database value that selects a throwaway in-memory store
pub const MEMORY_DATABASE: &str = ":memory:";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawGridlockConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub game: RawGameConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawGameConfig {
    pub tick_interval_ms: Option<u64>,
    pub bot_wait_secs: Option<u64>,
    pub forfeit_grace_secs: Option<u64>,
    pub bot_think_ms: Option<u64>,
    pub bot_skip_probability: Option<f64>,
    pub bot_name: Option<String>,
    pub leaderboard_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawStorageConfig {
    pub database: Option<String>,
    pub remote_url: Option<String>,
    pub auth_token: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridlockConfig {
    pub server: ServerConfig,
    pub game: GameSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Matchmaking and bot timings, in whole units for readable TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    /// Milliseconds between matchmaking passes
    pub tick_interval_ms: u64,
    /// Seconds a lone player waits before getting the bot
    pub bot_wait_secs: u64,
    /// Seconds a disconnected player has to come back
    pub forfeit_grace_secs: u64,
    /// Bot think time in milliseconds
    pub bot_think_ms: u64,
    pub bot_skip_probability: f64,
    pub bot_name: String,
    /// Rows returned by the leaderboard
    pub leaderboard_limit: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        let defaults = GameConfig::default();
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            bot_wait_secs: DEFAULT_BOT_WAIT_THRESHOLD.as_secs(),
            forfeit_grace_secs: DEFAULT_FORFEIT_GRACE.as_secs(),
            bot_think_ms: DEFAULT_BOT_THINK_DELAY.as_millis() as u64,
            bot_skip_probability: defaults.bot_skip_probability,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

impl GameSettings {
    /// Convert to the hub's settings
    pub fn to_game_config(&self) -> GameConfig {
        GameConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            bot_wait_threshold: Duration::from_secs(self.bot_wait_secs),
            forfeit_grace: Duration::from_secs(self.forfeit_grace_secs),
            bot_think_delay: Duration::from_millis(self.bot_think_ms),
            bot_skip_probability: self.bot_skip_probability,
            bot_name: self.bot_name.clone(),
            leaderboard_limit: self.leaderboard_limit,
        }
    }
}

/// Where finished games are written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Local database file, or `:memory:`
    pub database: String,
    /// Remote Turso URL; takes precedence over `database` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl StorageConfig {
    /// Copy with the auth token masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            auth_token: self.auth_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
