//! Operator endpoints: catalog sync, persistence and wipes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kitforge_catalog::CatalogStatus;
use kitforge_core::error::CoreError;
use kitforge_ledger::SaveOutcome;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::RequireApiToken;
use crate::response::DataResponse;
use crate::service::ServiceStatus;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncRequested {
    pub requested: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveResult {
    pub written: bool,
    pub players: usize,
}

#[derive(Debug, Serialize)]
pub struct SweepResult {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct WipeResult {
    pub cleared: usize,
    pub last_wipe: i64,
}

/// POST /admin/catalog/sync
///
/// Queues a fetch; a pending retry timer is superseded.
pub async fn sync_catalog(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> AppResult<(StatusCode, Json<DataResponse<SyncRequested>>)> {
    if !state.sync_trigger.request() {
        return Err(CoreError::Unavailable("Catalog sync driver is not running".into()).into());
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SyncRequested { requested: true },
        }),
    ))
}

/// GET /admin/catalog/status
pub async fn catalog_status(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> Json<DataResponse<CatalogStatus>> {
    let status = state.service.lock().await.catalog_status();
    Json(DataResponse { data: status })
}

/// GET /admin/status
pub async fn service_status(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> Json<DataResponse<ServiceStatus>> {
    let status = state.service.lock().await.status();
    Json(DataResponse { data: status })
}

/// POST /admin/ledger/save
pub async fn save_ledger(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> AppResult<Json<DataResponse<SaveResult>>> {
    let mut service = state.service.lock().await;
    let outcome = service.save(Utc::now())?;
    let data = match outcome {
        SaveOutcome::Written { players } => SaveResult {
            written: true,
            players,
        },
        SaveOutcome::Clean => SaveResult {
            written: false,
            players: service.status().ledger.players,
        },
    };
    Ok(Json(DataResponse { data }))
}

/// POST /admin/ledger/sweep
pub async fn sweep_ledger(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> Json<DataResponse<SweepResult>> {
    let removed = state.service.lock().await.sweep(Utc::now());
    Json(DataResponse {
        data: SweepResult { removed },
    })
}

/// POST /admin/wipe
///
/// Clears all usage and restarts the post-wipe kit locks.
pub async fn new_wipe(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> AppResult<Json<DataResponse<WipeResult>>> {
    let now = Utc::now();
    let cleared = state.service.lock().await.new_wipe(now)?;
    Ok(Json(DataResponse {
        data: WipeResult {
            cleared,
            last_wipe: now.timestamp(),
        },
    }))
}
