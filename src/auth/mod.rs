//! Admin authentication
//!
//! A single admin password, hashed in the settings table, unlocks a session
//! identified by a cookie. Sessions expire after a fixed age.

mod password;
mod session;

pub use password::*;
pub use session::*;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{get_setting, set_setting};

/// Settings key holding the admin password hash
pub const PASSWORD_SETTING: &str = "admin_password";

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "prodvision_session";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    Required,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Authentication not configured")]
    NotConfigured,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] BcryptError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Required | AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AuthError::NotConfigured | AuthError::Database(_) | AuthError::Hash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match &self {
            AuthError::Database(e) => tracing::error!("Authentication lookup failed: {}", e),
            AuthError::Hash(e) => tracing::error!("Password hashing failed: {}", e),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Authentication state of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthContext {
    Anonymous,
    Authenticated { session_id: Uuid },
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }

    /// Resolve the session cookie, if any, against the store
    pub async fn resolve(sessions: &SessionStore, headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        let Some(session_id) = session_id_from(&jar) else {
            return AuthContext::Anonymous;
        };

        if sessions.is_active(&session_id).await {
            AuthContext::Authenticated { session_id }
        } else {
            AuthContext::Anonymous
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionStore::from_ref(state);
        sessions.sweep_expired().await;
        Ok(AuthContext::resolve(&sessions, &parts.headers).await)
    }
}

/// Gate for admin-only routes: sweeps expired sessions, then rejects
/// anonymous requests with 401
pub async fn require_auth(
    State(sessions): State<SessionStore>,
    request: Request,
    next: Next,
) -> Response {
    sessions.sweep_expired().await;

    let context = AuthContext::resolve(&sessions, request.headers()).await;
    if !context.is_authenticated() {
        tracing::debug!("Rejected unauthenticated {} {}", request.method(), request.uri().path());
        return AuthError::Required.into_response();
    }

    next.run(request).await
}

/// Occasionally sweep expired sessions while serving any request
pub async fn sweep_sessions(
    State(sessions): State<SessionStore>,
    request: Request,
    next: Next,
) -> Response {
    sessions.maybe_sweep().await;
    next.run(request).await
}

/// Check the admin password and open a session, returning the cookie jar to send back
pub async fn login(
    pool: &SqlitePool,
    sessions: &SessionStore,
    jar: CookieJar,
    password: &str,
) -> Result<CookieJar, AuthError> {
    let stored = get_setting(pool, PASSWORD_SETTING)
        .await?
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::NotConfigured)?;

    // Keep bcrypt off the async workers
    let password = password.to_string();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or(false);

    if !matches {
        tracing::warn!("Failed admin login attempt");
        return Err(AuthError::InvalidPassword);
    }

    let session_id = sessions.create().await;
    tracing::info!("Admin logged in");

    Ok(jar.add(session_cookie(session_id)))
}

/// End the session named by the cookie, if any, and clear the cookie
pub async fn logout(sessions: &SessionStore, jar: CookieJar) -> CookieJar {
    if let Some(session_id) = session_id_from(&jar) {
        if sessions.remove(&session_id).await {
            tracing::info!("Admin logged out");
        }
    }
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Store the default admin password when none is configured.
/// Returns whether a password was written.
pub async fn seed_admin_password(
    pool: &SqlitePool,
    default_password: &str,
    cost: u32,
) -> Result<bool, AuthError> {
    let existing = get_setting(pool, PASSWORD_SETTING).await?;
    if existing.is_some_and(|h| !h.is_empty()) {
        return Ok(false);
    }

    set_admin_password(pool, default_password, cost).await?;
    tracing::warn!("No admin password configured; the default password is in effect and should be changed");
    Ok(true)
}

/// Hash and store a new admin password
pub async fn set_admin_password(pool: &SqlitePool, password: &str, cost: u32) -> Result<(), AuthError> {
    let hash = hash_password(password, cost)?;
    set_setting(pool, PASSWORD_SETTING, &hash).await?;
    Ok(())
}

fn session_cookie(session_id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn session_id_from(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}
