//! Channel-backed analytics sink

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{AnalyticsSink, GameOverEvent};
use crate::error::AnalyticsError;

/// Publishes game-over events on a broadcast channel
///
/// Publishing never blocks. With no subscribers the event is dropped.
pub struct BroadcastAnalytics {
    tx: broadcast::Sender<GameOverEvent>,
}

impl BroadcastAnalytics {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameOverEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl AnalyticsSink for BroadcastAnalytics {
    async fn publish_game_over(&self, event: GameOverEvent) -> Result<(), AnalyticsError> {
        // Ignore if no receivers
        let _ = self.tx.send(event);
        Ok(())
    }
}
