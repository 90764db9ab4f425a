//! Statistics API routes

use axum::{extract::State, routing::get, Json, Router};
use axum_extra::extract::Query;

use crate::db;
use crate::query::{compute_stats, compute_xva_stats, StatsReport, XvaStatsReport};

use super::{AppError, AppState, EntryQuery};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/xva/stats", get(get_xva_stats))
}

async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<StatsReport>, AppError> {
    let filter = query.to_filter()?;
    let entries = db::list_entries(&state.pool).await?;
    Ok(Json(compute_stats(&entries, &filter)))
}

async fn get_xva_stats(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<XvaStatsReport>, AppError> {
    let filter = query.to_filter()?;
    let entries = db::list_entries_by_application(&state.pool, crate::domain::XVA).await?;
    Ok(Json(compute_xva_stats(&entries, &filter)))
}
