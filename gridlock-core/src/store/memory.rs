//! In-memory result store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{GameRecord, LeaderboardEntry, ResultStore};
use crate::error::StoreError;
use crate::protocol::DRAW_MARKER;

/// Keeps finished games in a Vec. Used in tests and when no database is configured.
#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<Vec<GameRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded games in insertion order
    pub async fn records(&self) -> Vec<GameRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn record_result(&self, record: &GameRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn top_winners(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let records = self.records.read().await;

        let mut wins: HashMap<&str, u64> = HashMap::new();
        for record in records.iter().filter(|r| r.winner != DRAW_MARKER) {
            *wins.entry(record.winner.as_str()).or_default() += 1;
        }

        let mut entries: Vec<LeaderboardEntry> = wins
            .into_iter()
            .map(|(username, wins)| LeaderboardEntry {
                username: username.to_string(),
                wins,
            })
            .collect();
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.username.cmp(&b.username)));
        entries.truncate(limit);

        Ok(entries)
    }
}
