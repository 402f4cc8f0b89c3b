//! Game orchestration settings

use std::time::Duration;

use crate::game::bot::DEFAULT_SKIP_PROBABILITY;

/// Default interval between matchmaking passes
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Default wait before a lone player is matched against the bot
pub const DEFAULT_BOT_WAIT_THRESHOLD: Duration = Duration::from_secs(10);
/// Default grace period for a disconnected player to come back
pub const DEFAULT_FORFEIT_GRACE: Duration = Duration::from_secs(30);
/// Default simulated think time for bot moves
pub const DEFAULT_BOT_THINK_DELAY: Duration = Duration::from_millis(500);
/// Default display name for the bot opponent
pub const DEFAULT_BOT_NAME: &str = "Bot";
/// Default number of leaderboard rows
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Timing and bot settings for the hub
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Interval between matchmaking passes
    pub tick_interval: Duration,
    /// How long a player waits alone before being matched with the bot
    pub bot_wait_threshold: Duration,
    /// Grace period after a mid-game disconnect before forfeiting
    pub forfeit_grace: Duration,
    /// Delay before the bot plays its move
    pub bot_think_delay: Duration,
    /// Probability the bot passes over each preferred column
    pub bot_skip_probability: f64,
    /// Username shown for the bot slot
    pub bot_name: String,
    /// Rows returned by the leaderboard
    pub leaderboard_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            bot_wait_threshold: DEFAULT_BOT_WAIT_THRESHOLD,
            forfeit_grace: DEFAULT_FORFEIT_GRACE,
            bot_think_delay: DEFAULT_BOT_THINK_DELAY,
            bot_skip_probability: DEFAULT_SKIP_PROBABILITY,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}
