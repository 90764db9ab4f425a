//! Integration tests driving the HTTP API through the router

mod admin_api;
mod entries_api;
mod stats_api;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;

use prodvision::{
    api::{build_router, AppState},
    auth::set_admin_password,
    config::AppConfig,
    db::init_database,
};

pub const ADMIN_PASSWORD: &str = "test-admin-pw";

/// Router over a fresh in-memory database with a known admin password
pub async fn setup_app() -> Router {
    let pool = init_database("sqlite::memory:").await.unwrap();
    set_admin_password(&pool, ADMIN_PASSWORD, 4).await.unwrap();

    let mut config = AppConfig::default();
    config.auth.sweep_probability = 0.0;

    build_router(AppState::new(pool, config))
}

/// Build a request, optionally with a JSON body and a session cookie
pub fn request(method: &str, uri: &str, body: Option<&Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and return the status with the parsed JSON body
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Log in and return the `name=value` pair to send back as the Cookie header
pub async fn login(app: &Router) -> String {
    let body = serde_json::json!({ "password": ADMIN_PASSWORD });
    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/login", Some(&body), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a session cookie")
        .to_str()
        .unwrap()
        .to_string();
    set_cookie.split(';').next().unwrap().trim().to_string()
}
