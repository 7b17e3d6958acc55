//! Integration tests for [`CatalogApi`] against an in-process HTTP server.
//!
//! Each test binds an axum router to an ephemeral port and points the
//! client at it, so the full request path (query string, bearer header,
//! status handling, body validation) is exercised without external
//! services.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use kitforge_catalog::{CatalogApi, CatalogFetchError};

const TOKEN: &str = "test-token";
const CATEGORY: &str = "42";

/// Serve `router` on 127.0.0.1 and return its address.
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> CatalogApi {
    CatalogApi::new(
        format!("http://{addr}/api/kits"),
        TOKEN.to_string(),
        CATEGORY.to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

/// Handler that checks the credential and category before answering.
async fn authorized_kits(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Bearer {TOKEN}") {
        return (StatusCode::UNAUTHORIZED, "denied".into());
    }
    if params.get("id").map(String::as_str) != Some(CATEGORY) {
        return (StatusCode::BAD_REQUEST, "wrong category".into());
    }
    (
        StatusCode::OK,
        r#"[{"Name":"Medic","Cooldown":60}, {"Name":""}, {"Name":"Raider"}]"#.into(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_sends_credential_and_category() {
    let addr = serve(Router::new().route("/api/kits", get(authorized_kits))).await;

    let parsed = client(addr).fetch().await.unwrap();
    let names: Vec<_> = parsed.kits.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, vec!["Medic", "Raider"]);
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.kits[0].cooldown, 60);
}

#[tokio::test]
async fn non_200_is_a_fetch_failure() {
    let router = Router::new().route(
        "/api/kits",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let addr = serve(router).await;

    let err = client(addr).fetch().await.unwrap_err();
    assert_matches!(
        err,
        CatalogFetchError::HttpStatus { status: 503, ref preview } if preview == "maintenance"
    );
}

#[tokio::test]
async fn html_challenge_page_is_rejected() {
    let router = Router::new().route(
        "/api/kits",
        get(|| async { "<html><body>Checking your browser</body></html>" }),
    );
    let addr = serve(router).await;

    assert_matches!(
        client(addr).fetch().await,
        Err(CatalogFetchError::NotJson { .. })
    );
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let router = Router::new().route("/api/kits", get(|| async { "" }));
    let addr = serve(router).await;

    assert_matches!(client(addr).fetch().await, Err(CatalogFetchError::EmptyBody));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    // Bind then drop a listener to obtain a port nobody is serving.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert_matches!(
        client(addr).fetch().await,
        Err(CatalogFetchError::Request(_))
    );
}
