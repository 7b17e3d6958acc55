use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Operator routes mounted at `/admin`.
///
/// ```text
/// GET  /status            -> service_status
/// POST /catalog/sync      -> sync_catalog (202)
/// GET  /catalog/status    -> catalog_status
/// POST /ledger/save       -> save_ledger
/// POST /ledger/sweep      -> sweep_ledger
/// POST /wipe              -> new_wipe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(admin::service_status))
        .route("/catalog/sync", post(admin::sync_catalog))
        .route("/catalog/status", get(admin::catalog_status))
        .route("/ledger/save", post(admin::save_ledger))
        .route("/ledger/sweep", post(admin::sweep_ledger))
        .route("/wipe", post(admin::new_wipe))
}
