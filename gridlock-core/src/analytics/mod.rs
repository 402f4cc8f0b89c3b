//! Analytics collaborator
//!
//! The hub publishes a [`GameOverEvent`] for each finished session.
//! [`BroadcastAnalytics`] fans events out over a channel and
//! [`AnalyticsAggregator`] folds them into running statistics.

mod aggregator;
mod broadcast;

pub use aggregator::{AnalyticsAggregator, AnalyticsSnapshot};
pub use broadcast::BroadcastAnalytics;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::SessionId;

/// Published once per finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverEvent {
    pub session_id: SessionId,
    pub winner: String,
    pub duration_seconds: f64,
    pub finished_at: DateTime<Utc>,
}

/// Receives game-over events
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn publish_game_over(&self, event: GameOverEvent) -> Result<(), AnalyticsError>;
}
