//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_with, get, TestAppOptions};

// ---------------------------------------------------------------------------
// Test: GET /health reports readiness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_when_ready() {
    let app = build_test_app().await;
    let response = get(&app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["catalog_ready"], true);
    assert_eq!(json["ledger_loaded"], true);
}

#[tokio::test]
async fn health_check_is_degraded_while_loading() {
    let app = build_test_app_with(TestAppOptions {
        catalog: false,
        ledger: false,
        ..Default::default()
    })
    .await;
    let json = body_json(get(&app.router, "/health").await).await;

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["catalog_ready"], false);
    assert_eq!(json["ledger_loaded"], false);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app().await;
    let response = get(&app.router, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = build_test_app().await;
    let response = get(&app.router, "/health").await;

    assert!(response.headers().contains_key("x-request-id"));
}
