use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a kit catalog snapshot is being served.
    pub catalog_ready: bool,
    /// Whether the usage ledger finished its startup load.
    pub ledger_loaded: bool,
}

/// GET /health -- returns service, catalog and ledger readiness.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (catalog_ready, ledger_loaded) = {
        let service = state.service.lock().await;
        (service.catalog_ready(), service.ledger_loaded())
    };

    let status = if catalog_ready && ledger_loaded {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        catalog_ready,
        ledger_loaded,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
