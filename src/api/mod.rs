//! REST API routes for ProdVision

mod admin;
mod auth;
mod entries;
mod stats;

pub use admin::*;
pub use auth::*;
pub use entries::*;
pub use stats::*;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, sweep_sessions, AuthError, SessionStore};
use crate::config::AppConfig;
use crate::db::StoreError;
use crate::domain::DATE_FORMAT;
use crate::query::EntryFilter;
use crate::validation::ValidationError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Auth(e) = self {
            return e.into_response();
        }

        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Conflict { .. }) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Database(e)) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            pool,
            sessions: SessionStore::from_config(&config.auth),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Query parameters shared by the listing and statistics endpoints.
/// `year` and `month` may repeat.
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub application: Option<String>,
    pub quality_status: Option<String>,
    pub prb_only: Option<String>,
    pub hiim_only: Option<String>,
    #[serde(default)]
    pub year: Vec<String>,
    #[serde(default)]
    pub month: Vec<String>,
}

impl EntryQuery {
    pub fn to_filter(&self) -> Result<EntryFilter, AppError> {
        let years = present(&self.year)
            .map(|y| {
                y.parse::<i32>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid year: {}", y)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let months = present(&self.month)
            .map(|m| match m.parse::<u32>() {
                Ok(month) if (1..=12).contains(&month) => Ok(month),
                _ => Err(AppError::BadRequest(format!("Invalid month: {}", m))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntryFilter {
            start_date: parse_date_param("start_date", &self.start_date)?,
            end_date: parse_date_param("end_date", &self.end_date)?,
            application: non_empty(&self.application),
            quality_status: non_empty(&self.quality_status),
            prb_only: is_true(&self.prb_only),
            hiim_only: is_true(&self.hiim_only),
            years,
            months,
        })
    }
}

fn present(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

fn is_true(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn parse_date_param(name: &str, value: &Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", name, v))),
    }
}

/// Build the application router.
///
/// Reads and authentication endpoints are public; entry writes and the admin
/// endpoints sit behind the session gate.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(entry_write_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            require_auth,
        ));

    let public = Router::new()
        .route("/health", get(health_check))
        .merge(entry_read_routes())
        .merge(stats_routes())
        .merge(auth_routes());

    let mut app = Router::new()
        .merge(protected)
        .merge(public)
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            sweep_sessions,
        ))
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
