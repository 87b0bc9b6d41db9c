//! Integration tests for wsis-web API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Session bootstrap and status reporting
//! - Taxonomy serving
//! - Report creation, listing, week filtering, and deletion
//! - Validation and authentication failures

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method
use wsis_common::config::AppConfig;
use wsis_web::session::{SessionManager, SqliteIdentityProvider};
use wsis_web::store::ReportStore;
use wsis_web::{build_router, db, AppState};

/// Test helper: fresh database in a temp dir, bootstrapped session, router
async fn setup_app() -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        root_folder: dir.path().to_path_buf(),
        bind_address: "127.0.0.1:0".to_string(),
        app_id: "test-app".to_string(),
        bootstrap_token: None,
    };
    let pool = db::init_database(&config.database_path())
        .await
        .expect("Should initialize test database");

    let session = Arc::new(SessionManager::new(Arc::new(SqliteIdentityProvider::new(
        pool.clone(),
    ))));
    session.bootstrap(None).await;

    let store = Arc::new(ReportStore::new(pool, config.app_id.clone()));
    let state = AppState::new(Arc::new(config), session, store);
    (dir, build_router(state))
}

/// Test helper: router without an established session
async fn setup_app_signed_out() -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        root_folder: dir.path().to_path_buf(),
        bind_address: "127.0.0.1:0".to_string(),
        app_id: "test-app".to_string(),
        bootstrap_token: None,
    };
    let pool = db::init_database(&config.database_path())
        .await
        .expect("Should initialize test database");

    // No bootstrap call: the manager holds no identity
    let session = Arc::new(SessionManager::new(Arc::new(SqliteIdentityProvider::new(
        pool.clone(),
    ))));
    let store = Arc::new(ReportStore::new(pool, config.app_id.clone()));
    let state = AppState::new(Arc::new(config), session, store);
    (dir, build_router(state))
}

/// Test helper: create request with empty body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: create request with a JSON body
fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: a valid report body for the given week and site
fn report_body(week: &str, site: &str) -> Value {
    json!({
        "reportingWeek": week,
        "siteName": site,
        "proofLink": "https://example.com/proof",
        "categories": {
            "riskAssessment": {
                "ra_weekly": { "plan": "주간 평가", "performance": "완료", "status": "완료" }
            }
        }
    })
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wsis-web");
    assert!(body["version"].is_string());
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_session_ready_after_bootstrap() {
    let (_dir, app) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/session")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "ready");
    assert!(body["userId"].is_string());
    assert_eq!(body["appId"], "test-app");
    let namespace = body["namespace"].as_str().unwrap();
    assert!(namespace.starts_with("artifacts/test-app/users/"));
    assert!(namespace.ends_with("/weeklyReports"));
    // No alert key when nothing is pending
    assert!(body.get("alert").is_none());
}

#[tokio::test]
async fn test_session_retry_establishes_identity() {
    let (_dir, app) = setup_app_signed_out().await;

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/session/retry"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "ready");
    assert!(body["userId"].is_string());
}

// =============================================================================
// Taxonomy Tests
// =============================================================================

#[tokio::test]
async fn test_taxonomy_structure() {
    let (_dir, app) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/taxonomy")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 11);
    assert_eq!(sites[0], "현장 A");

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 6);
    let leaf_count: usize = categories
        .iter()
        .map(|c| c["subcategories"].as_array().unwrap().len())
        .sum();
    assert_eq!(leaf_count, 20);
    assert_eq!(categories[0]["id"], "riskAssessment");
    assert_eq!(categories[0]["name"], "위험성평가");
}

// =============================================================================
// Report Write/Read Tests
// =============================================================================

#[tokio::test]
async fn test_create_and_list_round_trip() {
    let (_dir, app) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports",
            &report_body("2025-W30", "현장 A"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert_eq!(created["reportingWeek"], "2025-W30");
    assert_eq!(created["siteName"], "현장 A");
    assert!(created["id"].is_string());
    assert!(created["createdAt"].is_string());
    // Normalized to the full taxonomy shape
    assert_eq!(
        created["categories"]["riskAssessment"]["ra_weekly"]["plan"],
        "주간 평가"
    );
    assert_eq!(created["categories"]["emergency"]["em_drill"]["plan"], "");

    let response = app.oneshot(test_request("GET", "/api/reports")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["weeks"], json!(["2025-W30"]));
    assert_eq!(body["reports"][0]["id"], created["id"]);
    // The dashboard's proof-link and submission-time columns render these
    assert_eq!(body["reports"][0]["proofLink"], "https://example.com/proof");
    assert!(body["reports"][0]["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_rejects_unknown_site() {
    let (_dir, app) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/reports",
            &report_body("2025-W30", "현장 Z"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "invalid-input");
}

#[tokio::test]
async fn test_create_rejects_malformed_week() {
    let (_dir, app) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/reports",
            &report_body("2025/30", "현장 A"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "invalid-input");
}

#[tokio::test]
async fn test_reports_require_session() {
    let (_dir, app) = setup_app_signed_out().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/reports"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "not-authenticated");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/reports",
            &report_body("2025-W30", "현장 A"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Week Filter Tests
// =============================================================================

#[tokio::test]
async fn test_week_filter_and_ordering() {
    let (_dir, app) = setup_app().await;

    for (week, site) in [
        ("2025-W29", "현장 B"),
        ("2025-W30", "현장 C"),
        ("2025-W30", "현장 A"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/reports", &report_body(week, site)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/reports?week=2025-W30"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    // Distinct weeks from the full set, most recent first
    assert_eq!(body["weeks"], json!(["2025-W30", "2025-W29"]));
    assert_eq!(body["selectedWeek"], "2025-W30");
    assert_eq!(body["total"], 2);
    // Table order is site name ascending
    assert_eq!(body["reports"][0]["siteName"], "현장 A");
    assert_eq!(body["reports"][1]["siteName"], "현장 C");

    // Empty week parameter means no filtering
    let response = app
        .oneshot(test_request("GET", "/api/reports?week="))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert!(body.get("selectedWeek").is_none());
}

// =============================================================================
// Deletion Tests
// =============================================================================

#[tokio::test]
async fn test_delete_then_not_found() {
    let (_dir, app) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports",
            &report_body("2025-W30", "현장 A"),
        ))
        .await
        .unwrap();
    let created = extract_json(response.into_body()).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/api/reports/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "deleted");

    // Deleting the same report twice fails rather than silently succeeding
    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/api/reports/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "not-found");

    let response = app.oneshot(test_request("GET", "/api/reports")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["weeks"], json!([]));
}

// =============================================================================
// UI Serving Tests
// =============================================================================

#[tokio::test]
async fn test_index_page_served() {
    let (_dir, app) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("주간 안전점검"));
    assert!(html.contains("/static/app.js"));
    // Manual alert close and the read-only submission-date display
    assert!(html.contains("alert-close"));
    assert!(html.contains("작성일"));
}

#[tokio::test]
async fn test_dashboard_script_renders_report_rows() {
    let (_dir, app) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/static/app.js")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let js = String::from_utf8(bytes.to_vec()).unwrap();
    // Row-per-report table carries the site, proof-link, submission-time
    // and delete columns
    assert!(js.contains("현장명"));
    assert!(js.contains("증빙 링크"));
    assert!(js.contains("제출일시"));
    assert!(js.contains("proofLink"));
    assert!(js.contains("toLocaleString('ko-KR')"));
    assert!(js.contains("data-delete"));
    // Successful submission recomputes the current week and date
    assert!(js.contains("setDefaultWeekAndDate"));
}
