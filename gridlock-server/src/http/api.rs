//! JSON API handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use gridlock_core::{AnalyticsSnapshot, LeaderboardEntry};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

/// Most rows a leaderboard request may ask for
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Games in progress
    pub active_sessions: usize,
    /// Players waiting for an opponent
    pub waiting_players: usize,
}

/// Error body for failed API requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for the leaderboard
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Health check endpoint
///
/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_sessions: state.hub.active_sessions(),
        waiting_players: state.hub.waiting_players(),
    })
}

/// Top winners
///
/// GET /api/leaderboard?limit=N
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query
        .limit
        .unwrap_or(state.hub.config().leaderboard_limit)
        .min(MAX_LEADERBOARD_LIMIT);

    match state.store.top_winners(limit).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            warn!(error = %e, "Leaderboard query failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Aggregated game statistics
///
/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<AnalyticsSnapshot> {
    Json(state.aggregator.snapshot())
}
