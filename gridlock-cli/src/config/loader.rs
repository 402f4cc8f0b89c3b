use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;

use super::types::{
    DEFAULT_HOST, DEFAULT_PORT, GameSettings, GridlockConfig, RawGameConfig, RawGridlockConfig,
    RawServerConfig, RawStorageConfig, ServerConfig, StorageConfig,
};

/// Environment variable that moves the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "GRIDLOCK_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (defaults, then user, then project)
    pub fn load() -> Result<GridlockConfig> {
        Self::load_layers(Self::user_config_path().as_deref(), &Self::project_config_path())
    }

    /// Load and merge the given files in order; missing files are skipped
    pub fn load_layers(user: Option<&Path>, project: &Path) -> Result<GridlockConfig> {
        let mut raw = RawGridlockConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Project config
        if project.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(project)?);
        }

        Self::finalize(raw)
    }

    /// Load a single config file over the defaults
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<GridlockConfig> {
        Self::load_layers(None, path)
    }

    fn read_raw(path: &Path) -> Result<RawGridlockConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "gridlock")
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with GRIDLOCK_PROJECT_CONFIG_DIR
    pub fn project_config_path() -> PathBuf {
        match std::env::var(PROJECT_CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir).join("config.toml"),
            Err(_) => PathBuf::from(".gridlock/config.toml"),
        }
    }

    /// Default database file under the platform data directory
    pub fn default_database_path() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("games.db"))
            .unwrap_or_else(|| PathBuf::from("gridlock.db"))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawGridlockConfig, overlay: RawGridlockConfig) -> RawGridlockConfig {
        RawGridlockConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            game: RawGameConfig {
                tick_interval_ms: overlay.game.tick_interval_ms.or(base.game.tick_interval_ms),
                bot_wait_secs: overlay.game.bot_wait_secs.or(base.game.bot_wait_secs),
                forfeit_grace_secs: overlay
                    .game
                    .forfeit_grace_secs
                    .or(base.game.forfeit_grace_secs),
                bot_think_ms: overlay.game.bot_think_ms.or(base.game.bot_think_ms),
                bot_skip_probability: overlay
                    .game
                    .bot_skip_probability
                    .or(base.game.bot_skip_probability),
                bot_name: overlay.game.bot_name.or(base.game.bot_name),
                leaderboard_limit: overlay
                    .game
                    .leaderboard_limit
                    .or(base.game.leaderboard_limit),
            },
            storage: RawStorageConfig {
                database: overlay.storage.database.or(base.storage.database),
                remote_url: overlay.storage.remote_url.or(base.storage.remote_url),
                auth_token: overlay.storage.auth_token.or(base.storage.auth_token),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawGridlockConfig) -> Result<GridlockConfig> {
        let defaults = GameSettings::default();
        let game = GameSettings {
            tick_interval_ms: raw.game.tick_interval_ms.unwrap_or(defaults.tick_interval_ms),
            bot_wait_secs: raw.game.bot_wait_secs.unwrap_or(defaults.bot_wait_secs),
            forfeit_grace_secs: raw
                .game
                .forfeit_grace_secs
                .unwrap_or(defaults.forfeit_grace_secs),
            bot_think_ms: raw.game.bot_think_ms.unwrap_or(defaults.bot_think_ms),
            bot_skip_probability: raw
                .game
                .bot_skip_probability
                .unwrap_or(defaults.bot_skip_probability),
            bot_name: raw.game.bot_name.unwrap_or(defaults.bot_name),
            leaderboard_limit: raw
                .game
                .leaderboard_limit
                .unwrap_or(defaults.leaderboard_limit),
        };
        Self::validate(&game)?;

        Ok(GridlockConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            game,
            storage: StorageConfig {
                database: raw.storage.database.unwrap_or_else(|| {
                    Self::default_database_path().to_string_lossy().into_owned()
                }),
                remote_url: raw.storage.remote_url,
                auth_token: raw.storage.auth_token,
            },
        })
    }

    fn validate(game: &GameSettings) -> Result<()> {
        ensure!(
            game.tick_interval_ms > 0,
            "game.tick_interval_ms must be greater than zero"
        );
        ensure!(
            (0.0..=1.0).contains(&game.bot_skip_probability),
            "game.bot_skip_probability must be between 0 and 1, got {}",
            game.bot_skip_probability
        );
        ensure!(
            !game.bot_name.trim().is_empty(),
            "game.bot_name must not be empty"
        );
        Ok(())
    }
}
