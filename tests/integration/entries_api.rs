//! Entry CRUD and listing over HTTP

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::{login, request, send, setup_app};

fn cvar_entry(date: &str) -> Value {
    json!({
        "date": date,
        "application_name": "CVAR ALL",
        "prc_mail_text": "07:45",
        "prc_mail_status": "Green",
        "quality_status": "Green"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;
    let response = tower::ServiceExt::oneshot(app, request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_writes_require_authentication() {
    let app = setup_app().await;

    let (status, body) = send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-01-06")), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");

    let (status, _) = send(&app, request("DELETE", "/api/entries/1", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public
    let (status, body) = send(&app, request("GET", "/api/entries", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_login_status_logout() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        request("POST", "/api/auth/login", Some(&json!({ "password": "nope" })), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid password");

    let cookie = login(&app).await;

    let (_, body) = send(&app, request("GET", "/api/auth/status", None, Some(&cookie))).await;
    assert_eq!(body["authenticated"], true);

    let (status, body) = send(&app, request("POST", "/api/auth/logout", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (_, body) = send(&app, request("GET", "/api/auth/status", None, Some(&cookie))).await;
    assert_eq!(body["authenticated"], false);

    let (status, _) = send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-01-06")), Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_fetch_entry() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let mut payload = cvar_entry("2025-01-06");
    payload["prbs"] = json!([
        { "prb_id_number": 4711, "prb_id_status": "active", "prb_link": "https://tickets/4711" },
        { "prb_id_number": "4712", "prb_id_status": "closed" }
    ]);

    let (status, created) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["date"], "2025-01-06");
    assert_eq!(created["day"], "Monday");
    assert_eq!(created["prbs"].as_array().unwrap().len(), 2);
    assert_eq!(created["prbs"][0]["prb_id_number"], "4711");
    assert_eq!(created["prb_id_number"], "4711");
    assert_eq!(created["prb_id_status"], "active");

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, request("GET", &format!("/api/entries/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, listed) = send(&app, request("GET", "/api/entries", None, None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id);
}

#[tokio::test]
async fn test_duplicate_entry_is_rejected() {
    let app = setup_app().await;
    let cookie = login(&app).await;
    let payload = json!({ "date": "2025-01-01", "application_name": "XVA" });

    let (status, _) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "An entry already exists for XVA on 2025-01-01");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let payload = json!({ "date": "2025-01-06", "application_name": "CVAR ALL", "issues": [] });
    let (status, body) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: prc_mail_text");

    let mut payload = cvar_entry("2025-01-06");
    payload["quality_status"] = json!("Orange");
    let (status, body) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid quality status");

    let mut payload = cvar_entry("2025-01-06");
    payload["hiims"] = json!([{ "hiim_id_number": "INC-1", "hiim_id_status": "active" }]);
    let (status, body) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid HIIM id number");

    // Body that is not JSON at all
    let mut req = request("POST", "/api/entries", None, Some(&cookie));
    req.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        "application/json".parse().unwrap(),
    );
    *req.body_mut() = axum::body::Body::from("{not json");
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_partial_update() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let mut payload = cvar_entry("2025-02-03");
    payload["remarks"] = json!("first run");
    let (_, created) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/entries/{}", id);

    let (status, updated) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "prc_mail_status": "Red" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["prc_mail_status"], "Red");
    assert_eq!(updated["remarks"], "first run");
    assert_eq!(updated["created_at"], created["created_at"]);

    // Clearing a required field is caught by the merged validation
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "prc_mail_text": "" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: prc_mail_text");

    let (status, body) = send(
        &app,
        request("PUT", "/api/entries/9999", Some(&json!({ "remarks": "x" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Entry not found");
}

#[tokio::test]
async fn test_update_into_existing_key_conflicts() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-03-03")), Some(&cookie))).await;
    let (_, other) = send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-03-04")), Some(&cookie))).await;
    let uri = format!("/api/entries/{}", other["id"]);

    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "date": "2025-03-03" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "An entry already exists for CVAR ALL on 2025-03-03");

    // Re-sending its own key is not a conflict
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "date": "2025-03-04", "application_name": "CVAR ALL" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["day"], "Tuesday");
}

#[tokio::test]
async fn test_update_with_empty_prbs_clears_them() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let mut payload = cvar_entry("2025-04-01");
    payload["prbs"] = json!([{ "prb_id_number": 1, "prb_id_status": "active" }]);
    let (_, created) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    let uri = format!("/api/entries/{}", created["id"]);

    let (status, _) = send(&app, request("PUT", &uri, Some(&json!({ "prbs": [] })), Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(fetched["prbs"], json!([]));
}

#[tokio::test]
async fn test_delete_entry() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let mut payload = cvar_entry("2025-05-05");
    payload["issues"] = json!([{ "description": "feed late", "remarks": "" }]);
    let (_, created) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    let uri = format!("/api/entries/{}", created["id"]);

    let (status, body) = send(&app, request("DELETE", &uri, None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Entry deleted successfully");

    let (status, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Entry not found");

    let (status, _) = send(&app, request("DELETE", &uri, None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let app = setup_app().await;
    let (status, body) = send(&app, request("GET", "/api/entries/abc", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Entry not found");
}

#[tokio::test]
async fn test_list_filters_and_order() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    for (date, app_name) in [
        ("2025-01-10", "CVAR ALL"),
        ("2025-01-20", "CVAR NYQ"),
        ("2025-02-01", "CVAR ALL"),
    ] {
        let mut payload = cvar_entry(date);
        payload["application_name"] = json!(app_name);
        let (status, _) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let xva = json!({
        "date": "2025-01-15",
        "application_name": "XVA",
        "hiims": [{ "hiim_id_number": 9, "hiim_id_status": "active" }]
    });
    send(&app, request("POST", "/api/entries", Some(&xva), Some(&cookie))).await;

    let (_, all) = send(&app, request("GET", "/api/entries", None, None)).await;
    let dates: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2025-02-01", "2025-01-20", "2025-01-15", "2025-01-10"]);

    let (_, january) = send(
        &app,
        request("GET", "/api/entries?start_date=2025-01-01&end_date=2025-01-31&application=cvar", None, None),
    )
    .await;
    assert_eq!(january.as_array().unwrap().len(), 2);

    let (_, with_hiim) = send(&app, request("GET", "/api/entries?hiim_only=true", None, None)).await;
    assert_eq!(with_hiim.as_array().unwrap().len(), 1);
    assert_eq!(with_hiim[0]["application_name"], "XVA");

    let (status, _) = send(&app, request("GET", "/api/entries?start_date=yesterday", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_with_null_keys_clears_tickets() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    let mut payload = cvar_entry("2025-04-02");
    payload["prbs"] = json!([{ "prb_id_number": 1, "prb_id_status": "active" }]);
    let (_, created) = send(&app, request("POST", "/api/entries", Some(&payload), Some(&cookie))).await;
    assert_eq!(created["prb_id_number"], "1");
    let uri = format!("/api/entries/{}", created["id"]);

    let patch = json!({ "prbs": null, "prb_id_number": null, "prb_id_status": null });
    let (status, updated) = send(&app, request("PUT", &uri, Some(&patch), Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["prbs"], json!([]));
    assert_eq!(updated["prb_id_number"], Value::Null);
    assert_eq!(updated["prb_id_status"], Value::Null);
    assert_eq!(updated["prc_mail_text"], "07:45");

    let (_, with_prb) = send(&app, request("GET", "/api/entries?prb_only=true", None, None)).await;
    assert_eq!(with_prb, json!([]));

    // Nulling a required field is caught by validation
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "prc_mail_status": null })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: prc_mail_status");
}

#[tokio::test]
async fn test_update_conflict_uses_normalized_date() {
    let app = setup_app().await;
    let cookie = login(&app).await;

    send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-03-03")), Some(&cookie))).await;
    let (_, other) = send(&app, request("POST", "/api/entries", Some(&cvar_entry("2025-03-04")), Some(&cookie))).await;
    let uri = format!("/api/entries/{}", other["id"]);

    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&json!({ "date": "2025-3-3" })), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "An entry already exists for CVAR ALL on 2025-03-03");

    let (_, fetched) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(fetched["date"], "2025-03-04");
}
