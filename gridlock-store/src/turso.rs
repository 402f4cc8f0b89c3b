//! Turso/libSQL implementation of the result store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridlock_core::{
    DRAW_MARKER, FinishReason, GameRecord, LeaderboardEntry, ResultStore, SessionId, StoreError,
};
use libsql::{Builder, Connection, Database};
use tracing::{debug, instrument};

use super::{Error, Result};

/// SQL schema for the games table.
const SCHEMA_GAMES: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id TEXT PRIMARY KEY,
    player1 TEXT NOT NULL,
    player2 TEXT NOT NULL,
    winner TEXT NOT NULL,
    reason TEXT NOT NULL,
    duration_seconds REAL NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQL index for leaderboard aggregation.
const INDEX_GAMES_WINNER: &str = r#"
CREATE INDEX IF NOT EXISTS idx_games_winner
ON games(winner)
"#;

/// Turso-backed store for finished games.
///
/// Holds one connection for its lifetime; an in-memory database only lives
/// as long as the connection that created it.
pub struct TursoResultStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoResultStore {
    /// Open (or create) a local embedded database file.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    /// Connect to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::from_database(db).await
    }

    /// Create an in-memory database (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA_GAMES, ()).await?;
        self.conn.execute(INDEX_GAMES_WINNER, ()).await?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(session_id = %record.session_id), level = "debug")]
    async fn insert(&self, record: &GameRecord) -> Result<()> {
        debug!(winner = %record.winner, reason = %record.reason, "inserting game result");
        self.conn
            .execute(
                "INSERT INTO games (id, player1, player2, winner, reason, duration_seconds, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    record.session_id.to_string(),
                    record.player1.clone(),
                    record.player2.clone(),
                    record.winner.clone(),
                    record.reason.as_str().to_string(),
                    record.duration_seconds,
                    format_datetime(record.finished_at)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT winner, COUNT(*) AS wins FROM games WHERE winner != ? GROUP BY winner ORDER BY wins DESC, winner ASC LIMIT ?",
                libsql::params![DRAW_MARKER.to_string(), limit as i64],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let username: String = row.get(0)?;
            let wins: i64 = row.get(1)?;
            entries.push(LeaderboardEntry {
                username,
                wins: u64::try_from(wins)
                    .map_err(|_| Error::InvalidData(format!("negative win count: {}", wins)))?,
            });
        }
        Ok(entries)
    }

    /// Most recently finished games, newest first.
    #[instrument(skip(self), level = "debug")]
    pub async fn recent_results(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, player1, player2, winner, reason, duration_seconds, created_at FROM games ORDER BY created_at DESC LIMIT ?",
                libsql::params![limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    /// Parse a game record from a database row.
    fn parse_record(row: &libsql::Row) -> Result<GameRecord> {
        let id_str: String = row.get(0)?;
        let player1: String = row.get(1)?;
        let player2: String = row.get(2)?;
        let winner: String = row.get(3)?;
        let reason_str: String = row.get(4)?;
        let duration_seconds: f64 = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        let session_id = SessionId(
            id_str
                .parse()
                .map_err(|_| Error::InvalidData(format!("invalid game id: {}", id_str)))?,
        );
        let reason: FinishReason = reason_str.parse().map_err(Error::InvalidData)?;

        Ok(GameRecord {
            session_id,
            player1,
            player2,
            winner,
            reason,
            duration_seconds,
            finished_at: parse_datetime(&created_at_str)?,
        })
    }
}

#[async_trait]
impl ResultStore for TursoResultStore {
    async fn record_result(&self, record: &GameRecord) -> std::result::Result<(), StoreError> {
        Ok(self.insert(record).await?)
    }

    async fn top_winners(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(self.leaderboard(limit).await?)
    }
}

/// Format a datetime for storage.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a datetime from storage.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidData(format!("invalid datetime: {}", s)))
}
