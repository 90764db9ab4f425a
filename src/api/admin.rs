//! Session maintenance routes, admin only

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::SessionStats;

use super::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/cleanup-sessions", post(cleanup_sessions))
        .route("/api/admin/session-stats", get(session_stats))
}

async fn cleanup_sessions(State(state): State<AppState>) -> Json<Value> {
    let removed = state.sessions.sweep_expired().await;
    Json(json!({
        "message": format!("Successfully cleaned up {} expired sessions", removed)
    }))
}

async fn session_stats(State(state): State<AppState>) -> Json<SessionStats> {
    Json(state.sessions.stats().await)
}
