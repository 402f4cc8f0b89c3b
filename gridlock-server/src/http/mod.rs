//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::AppState;
use crate::ws::ws_handler;

pub use api::{ErrorResponse, HealthResponse, LeaderboardQuery, MAX_LEADERBOARD_LIMIT};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(api::health))
        .route("/api/leaderboard", get(api::leaderboard))
        .route("/api/stats", get(api::stats))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
