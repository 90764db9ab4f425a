//! Authentication API routes

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, AuthContext};

use super::{AppError, AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/status", get(status))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let jar = auth::login(&state.pool, &state.sessions, jar, &req.password).await?;
    Ok((jar, Json(json!({ "message": "Authentication successful" }))))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = auth::logout(&state.sessions, jar).await;
    (jar, Json(json!({ "message": "Logged out successfully" })))
}

async fn status(context: AuthContext) -> Json<Value> {
    Json(json!({ "authenticated": context.is_authenticated() }))
}
