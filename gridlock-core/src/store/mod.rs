//! Persistence collaborator for finished games
//!
//! The hub writes one [`GameRecord`] per finished session and never waits on
//! the result; failures are logged by the caller. Reads feed the leaderboard.

mod memory;

pub use memory::MemoryResultStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::protocol::FinishReason;
use crate::types::SessionId;

/// A finished game as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub session_id: SessionId,
    pub player1: String,
    pub player2: String,
    /// Username of the winner, or the draw marker
    pub winner: String,
    pub reason: FinishReason,
    pub duration_seconds: f64,
    pub finished_at: DateTime<Utc>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wins: u64,
}

/// Storage for finished games
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a finished game
    async fn record_result(&self, record: &GameRecord) -> Result<(), StoreError>;

    /// Players with the most wins, descending, excluding draws
    async fn top_winners(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}
