#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use kitforge_api::background::catalog_sync::SyncTrigger;
use kitforge_api::config::{CatalogConfig, ServerConfig, ServiceConfig};
use kitforge_api::router::build_app_router;
use kitforge_api::service::{KitService, SharedService};
use kitforge_api::state::AppState;
use kitforge_catalog::parse_catalog_body;
use kitforge_ledger::{DocumentSource, LedgerLoader, LoadStep, LoadedDocument};

pub const PLAYER: u64 = 76_561_198_000_000_001;

/// Catalog served by every test app unless it is built unloaded.
pub const CATALOG: &str = r#"[
    {"Name": "Starter", "Description": "Basics",
     "MainItems": [{"Shortname": "rock", "Amount": 1}],
     "BeltItems": [{"Shortname": "torch", "Amount": 1}]},
    {"Name": "Medic", "Cooldown": 3600, "RequiredPermission": "kits.medic",
     "MainItems": [{"Shortname": "syringe.medical", "Amount": 5}]},
    {"Name": "Admin", "RequiredAuthLevel": 2, "IsHidden": true},
    {"Name": "Backpack",
     "MainItems": [{"Shortname": "smallbackpack", "Amount": 1,
                    "Contents": [{"Shortname": "bandage", "Amount": 3}]}]}
]"#;

/// Build a test `ServerConfig` with safe defaults rooted at `dir`.
pub fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        api_token: None,
        catalog: CatalogConfig {
            url: "http://127.0.0.1:9/catalog".to_string(),
            token: "test".to_string(),
            category_id: "1".to_string(),
            timeout_secs: 1,
        },
        service: ServiceConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        },
    }
}

/// A running test application.
pub struct TestApp {
    pub router: Router,
    pub service: SharedService,
    /// Receives manual sync requests; no driver runs in tests.
    pub sync_rx: mpsc::Receiver<()>,
    pub dir: TempDir,
}

/// Options for [`build_test_app_with`].
pub struct TestAppOptions {
    pub catalog: bool,
    pub ledger: bool,
    pub tweak: fn(&mut ServerConfig),
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            catalog: true,
            ledger: true,
            tweak: |_| {},
        }
    }
}

/// Build the full application with a loaded catalog and an empty ledger.
pub async fn build_test_app() -> TestApp {
    build_test_app_with(TestAppOptions::default()).await
}

/// Build the application through the same router as `main.rs`.
pub async fn build_test_app_with(options: TestAppOptions) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    (options.tweak)(&mut config);

    let service = KitService::new(&config.service).shared();
    {
        let mut guard = service.lock().await;
        if options.catalog {
            guard.apply_catalog_fetch(parse_catalog_body(CATALOG), Utc::now());
        }
        if options.ledger {
            let mut loader = LedgerLoader::from_document(
                LoadedDocument {
                    source: DocumentSource::Missing,
                    entries: Vec::new(),
                },
                config.service.loader_options(),
                Utc::now().timestamp(),
                CancellationToken::new(),
            );
            assert!(matches!(
                guard.apply_load_step(&mut loader),
                LoadStep::Complete(_)
            ));
        }
    }

    let (sync_trigger, sync_rx) = SyncTrigger::channel();
    let state = AppState {
        config: Arc::new(config.clone()),
        service: Arc::clone(&service),
        sync_trigger,
    };

    TestApp {
        router: build_app_router(state, &config),
        service,
        sync_rx,
        dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
