//! Shared application state for the gridlock server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gridlock_core::{
    AnalyticsAggregator, BroadcastAnalytics, GameConfig, HeuristicBot, Hub, MemoryResultStore,
    MoveStrategy, ResultStore,
};
use tokio::task::JoinHandle;

/// Capacity of the analytics broadcast channel
const ANALYTICS_CHANNEL_CAPACITY: usize = 1024;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Matchmaking and session orchestration
    pub hub: Arc<Hub>,
    /// Finished game storage, also read by the leaderboard
    pub store: Arc<dyn ResultStore>,
    /// Game-over event stream
    pub analytics: Arc<BroadcastAnalytics>,
    /// Running statistics fed from `analytics`
    pub aggregator: Arc<AnalyticsAggregator>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with default game settings and an in-memory store
    pub fn new() -> Self {
        Self::with_store(GameConfig::default(), Arc::new(MemoryResultStore::new()))
    }

    /// Create state with the given settings and store, using the heuristic bot
    pub fn with_store(config: GameConfig, store: Arc<dyn ResultStore>) -> Self {
        let strategy = Arc::new(HeuristicBot::new(config.bot_skip_probability));
        Self::with_components(config, store, strategy)
    }

    /// Create AppState with custom components (for testing)
    pub fn with_components(
        config: GameConfig,
        store: Arc<dyn ResultStore>,
        strategy: Arc<dyn MoveStrategy>,
    ) -> Self {
        let analytics = Arc::new(BroadcastAnalytics::new(ANALYTICS_CHANNEL_CAPACITY));
        let hub = Hub::new(config, Arc::clone(&store), analytics.clone(), strategy);

        Self {
            hub,
            store,
            analytics,
            aggregator: Arc::new(AnalyticsAggregator::new()),
            started_at: Utc::now(),
        }
    }

    /// Start the matchmaking loop and the analytics consumer
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let aggregator = Arc::clone(&self.aggregator);
        let rx = self.analytics.subscribe();
        let analytics_task = tokio::spawn(async move {
            aggregator.run(rx).await;
        });

        vec![self.hub.spawn_matchmaker(), analytics_task]
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
