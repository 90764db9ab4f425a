//! Session maintenance endpoints

use axum::http::StatusCode;

use super::{login, request, send, setup_app};

#[tokio::test]
async fn test_admin_endpoints_require_session() {
    let app = setup_app().await;

    let (status, _) = send(&app, request("GET", "/api/admin/session-stats", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("POST", "/api/admin/cleanup-sessions", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_stats_and_cleanup() {
    let app = setup_app().await;
    let cookie = login(&app).await;
    login(&app).await;

    let (status, stats) = send(&app, request("GET", "/api/admin/session-stats", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["expired_sessions"], 0);

    let (status, body) = send(&app, request("POST", "/api/admin/cleanup-sessions", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully cleaned up 0 expired sessions");
}

#[tokio::test]
async fn test_login_accepts_existing_bcrypt_hash() {
    use prodvision::{
        api::{build_router, AppState},
        auth::{seed_admin_password, PASSWORD_SETTING},
        config::AppConfig,
        db::{init_database, set_setting},
    };
    use serde_json::json;

    let pool = init_database("sqlite::memory:").await.unwrap();
    set_setting(
        &pool,
        PASSWORD_SETTING,
        "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
    )
    .await
    .unwrap();
    assert!(!seed_admin_password(&pool, "admin123", 4).await.unwrap());

    let mut config = AppConfig::default();
    config.auth.sweep_probability = 0.0;
    let app = build_router(AppState::new(pool, config));

    let (status, body) = send(
        &app,
        request("POST", "/api/auth/login", Some(&json!({ "password": "U*U" })), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Authentication successful");
}
