//! Dashboard statistics over HTTP

use axum::http::StatusCode;
use serde_json::json;

use super::{login, request, send, setup_app};

async fn seed(app: &axum::Router, cookie: &str) {
    let payloads = [
        json!({
            "date": "2025-01-06", "application_name": "CVAR ALL",
            "prc_mail_text": "07:40", "prc_mail_status": "Green", "quality_status": "Green"
        }),
        json!({
            "date": "2025-01-07", "application_name": "CVAR ALL",
            "prc_mail_text": "09:10", "prc_mail_status": "Red", "quality_status": "Red",
            "prb_id_number": 501, "prb_id_status": "active"
        }),
        json!({
            "date": "2025-03-03", "application_name": "CVAR NYQ",
            "prc_mail_text": "08:05", "prc_mail_status": "Yellow", "quality_status": "Green",
            "hiims": [{ "hiim_id_number": 77, "hiim_id_status": "closed" }]
        }),
        json!({
            "date": "2025-01-08", "application_name": "XVA",
            "valo_status": "Red", "sensi_status": "Red", "cf_ra_status": "Green",
            "root_cause_application": "Murex", "root_cause_type": "Data"
        }),
        json!({
            "date": "2025-02-10", "application_name": "XVA",
            "cf_ra_status": "Red"
        }),
        json!({
            "date": "2025-02-11", "application_name": "XVA",
            "valo_status": "Green"
        }),
    ];

    for payload in payloads {
        let (status, body) = send(app, request("POST", "/api/entries", Some(&payload), Some(cookie))).await;
        assert_eq!(status, StatusCode::CREATED, "seed failed: {}", body);
    }
}

#[tokio::test]
async fn test_stats_totals_and_distributions() {
    let app = setup_app().await;
    let cookie = login(&app).await;
    seed(&app, &cookie).await;

    let (status, stats) = send(&app, request("GET", "/api/stats?application=cvar", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(stats["total_entries"], 3);
    assert_eq!(stats["quality_distribution"], json!({ "Red": 1, "Yellow": 0, "Green": 2 }));
    assert_eq!(stats["punctuality_distribution"], json!({ "Red": 1, "Yellow": 1, "Green": 1 }));
    assert_eq!(stats["prb_distribution"], json!({ "active": 1, "closed": 0 }));
    assert_eq!(stats["hiim_distribution"], json!({ "active": 0, "closed": 1 }));
    assert_eq!(stats["application_distribution"], json!({ "CVAR ALL": 2, "CVAR NYQ": 1 }));

    // Only months with data appear without a period selection
    let months: Vec<&str> = stats["monthly_quality"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m[0].as_str().unwrap())
        .collect();
    assert_eq!(months, vec!["2025-01", "2025-03"]);
    assert_eq!(stats["monthly_quality"][0][1]["month_name"], "January 2025");
    assert_eq!(stats["monthly_quality"][0][1]["Red"], 1);
}

#[tokio::test]
async fn test_stats_year_and_month_selection() {
    let app = setup_app().await;
    let cookie = login(&app).await;
    seed(&app, &cookie).await;

    let (status, stats) = send(
        &app,
        request("GET", "/api/stats?year=2025&month=1&month=2", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_entries"], 5);

    let months: Vec<&str> = stats["monthly_prb"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m[0].as_str().unwrap())
        .collect();
    assert_eq!(months, vec!["2025-01", "2025-02"]);
    assert_eq!(stats["monthly_prb"][1][1], json!({ "month_name": "February 2025", "active": 0, "closed": 0 }));

    let (status, body) = send(&app, request("GET", "/api/stats?month=13", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid month: 13");
}

#[tokio::test]
async fn test_xva_stats() {
    let app = setup_app().await;
    let cookie = login(&app).await;
    seed(&app, &cookie).await;

    let (status, stats) = send(&app, request("GET", "/api/xva/stats", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let monthly = stats["monthly_red_counts"].as_array().unwrap();
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0][0], "2025-01");
    assert_eq!(
        monthly[0][1],
        json!({ "month_name": "January 2025", "valo_red": 1, "sensi_red": 1, "cf_ra_red": 0, "total_red": 1 })
    );
    assert_eq!(monthly[1][1]["cf_ra_red"], 1);
    assert_eq!(monthly[1][1]["total_red"], 1);

    assert_eq!(
        stats["root_cause_analysis"],
        json!([
            { "root_cause_application": "Murex", "root_cause_type": "Data", "count": 1 },
            { "root_cause_application": "Unknown", "root_cause_type": "Unknown", "count": 1 }
        ])
    );
    assert_eq!(stats["grand_total"], 2);

    // Filters other than the period do not apply to XVA stats
    let (_, filtered) = send(
        &app,
        request("GET", "/api/xva/stats?start_date=2025-02-01&quality_status=Green", None, None),
    )
    .await;
    assert_eq!(filtered["grand_total"], 1);
}
