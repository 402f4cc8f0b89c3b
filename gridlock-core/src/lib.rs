//! gridlock-core: session orchestration for gridlock
//!
//! This crate holds everything between the socket and the database:
//!
//! - **Game rules** - [`Board`] with gravity drops and win checks, and the
//!   [`HeuristicBot`] opponent
//! - **Sessions** - [`Session`], the per-match state machine with reconnect
//!   and forfeit handling
//! - **Matchmaking** - [`Matchmaker`], a FIFO queue paired once per tick, with
//!   bot fallback for players left waiting
//! - **Orchestration** - [`Hub`], which the transport layer calls for joins,
//!   moves, and disconnects
//! - **Collaborators** - [`ResultStore`] and [`AnalyticsSink`], told about
//!   every finished game
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gridlock_core::{
//!     BroadcastAnalytics, ConnectionHandle, GameConfig, HeuristicBot, Hub, MemoryResultStore,
//! };
//!
//! # async fn example() {
//! let hub = Hub::new(
//!     GameConfig::default(),
//!     Arc::new(MemoryResultStore::new()),
//!     Arc::new(BroadcastAnalytics::new(64)),
//!     Arc::new(HeuristicBot::default()),
//! );
//! hub.spawn_matchmaker();
//!
//! let (connection, mut outbound) = ConnectionHandle::channel();
//! hub.add_player(connection, "alice");
//! while let Some(message) = outbound.recv().await {
//!     println!("{message:?}");
//! }
//! # }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod game;
pub mod hub;
pub mod matchmaking;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod types;

// Re-export key types for convenience
pub use analytics::{
    AnalyticsAggregator, AnalyticsSink, AnalyticsSnapshot, BroadcastAnalytics, GameOverEvent,
};
pub use config::GameConfig;
pub use error::{AnalyticsError, MoveError, StoreError};
pub use game::{Board, BoardSnapshot, COLS, HeuristicBot, MoveStrategy, ROWS, Symbol};
pub use hub::{DisconnectOutcome, Hub, JoinOutcome};
pub use matchmaking::{Matchmaker, Pairing, WaitingEntry};
pub use protocol::{ClientMessage, DRAW_MARKER, FinishReason, ServerMessage};
pub use scheduler::{ScheduledTask, Scheduler};
pub use session::{
    ConnectionHandle, GraceTicket, IgnoreReason, MoveOutcome, Seat, Session, SessionListener,
    SessionOutcome, SessionState,
};
pub use store::{GameRecord, LeaderboardEntry, MemoryResultStore, ResultStore};
pub use types::{ConnectionId, SessionId};
