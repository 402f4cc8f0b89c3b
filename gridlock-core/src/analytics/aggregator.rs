//! Running game statistics

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::GameOverEvent;

/// Point-in-time view of the aggregated statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_games: u64,
    pub average_duration_seconds: f64,
    pub games_this_hour: u64,
}

#[derive(Default)]
struct Totals {
    games: u64,
    duration_seconds: f64,
    per_hour: HashMap<String, u64>,
}

/// Folds game-over events into totals
#[derive(Default)]
pub struct AnalyticsAggregator {
    totals: Mutex<Totals>,
}

fn hour_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:00").to_string()
}

impl AnalyticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn totals(&self) -> MutexGuard<'_, Totals> {
        match self.totals.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add one finished game and return the updated snapshot
    pub fn record(&self, event: &GameOverEvent) -> AnalyticsSnapshot {
        {
            let mut totals = self.totals();
            totals.games += 1;
            totals.duration_seconds += event.duration_seconds;
            *totals.per_hour.entry(hour_key(event.finished_at)).or_default() += 1;
        }
        self.snapshot_at(event.finished_at)
    }

    /// Statistics as of now
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        self.snapshot_at(Utc::now())
    }

    /// Statistics with `games_this_hour` measured for the hour containing `at`
    pub fn snapshot_at(&self, at: DateTime<Utc>) -> AnalyticsSnapshot {
        let totals = self.totals();
        let average_duration_seconds = if totals.games == 0 {
            0.0
        } else {
            totals.duration_seconds / totals.games as f64
        };

        AnalyticsSnapshot {
            total_games: totals.games,
            average_duration_seconds,
            games_this_hour: totals.per_hour.get(&hour_key(at)).copied().unwrap_or(0),
        }
    }

    /// Consume events until the channel closes
    pub async fn run(&self, mut rx: broadcast::Receiver<GameOverEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let snapshot = self.record(&event);
                    info!(
                        session_id = %event.session_id,
                        winner = %event.winner,
                        duration_seconds = event.duration_seconds,
                        total_games = snapshot.total_games,
                        average_duration_seconds = snapshot.average_duration_seconds,
                        games_this_hour = snapshot.games_this_hour,
                        "Analytics report"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Analytics consumer lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
