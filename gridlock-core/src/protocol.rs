//! WebSocket wire protocol
//!
//! Every frame is a JSON object `{"type": "...", "payload": {...}}`. Both
//! directions are modelled as tagged enums so inbound frames are decoded by
//! tag before anything is dispatched.

use serde::{Deserialize, Serialize};

use crate::game::{BoardSnapshot, Symbol};
use crate::types::SessionId;

/// Winner value recorded when a game ends without a winner
pub const DRAW_MARKER: &str = "Draw";

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Four in a row
    Win,
    /// Board filled without a winner
    Draw,
    /// A player stayed disconnected past the grace period
    Forfeit,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Win => "win",
            FinishReason::Draw => "draw",
            FinishReason::Forfeit => "forfeit",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(FinishReason::Win),
            "draw" => Ok(FinishReason::Draw),
            "forfeit" => Ok(FinishReason::Forfeit),
            other => Err(format!("unknown finish reason: {other}")),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ClientMessage {
    /// Enter matchmaking, or resume a game in progress under this name
    Join { username: String },

    /// Drop a disc into a zero-based column
    ///
    /// Signed so that negative columns decode and are then ignored like any
    /// other out-of-range move.
    Move { column: i64 },

    /// Application-level keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ServerMessage {
    /// A game began, or a reconnection was accepted
    Start {
        #[serde(rename = "gameId")]
        game_id: SessionId,
        opponent: String,
        symbol: Symbol,
        #[serde(rename = "isTurn")]
        is_turn: bool,
    },

    /// Board after an accepted move
    Update {
        board: BoardSnapshot,
        turn: Symbol,
        #[serde(rename = "isYourTurn")]
        is_your_turn: bool,
    },

    /// Terminal notification; `winner` is a username or [`DRAW_MARKER`]
    GameOver {
        winner: String,
        reason: FinishReason,
    },

    /// Request could not be processed
    Error { message: String },

    /// Keepalive
    Ping,
}
