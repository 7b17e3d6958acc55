pub mod admin;
pub mod health;
pub mod kits;
pub mod players;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires the bearer token when `API_TOKEN` is configured.
///
/// ```text
/// /kits                                     list kits
/// /kits/{name}                              definition
/// /kits/{name}/exists                       existence check
/// /kits/{name}/contents                     flattened item listing
///
/// /permissions                              registered permissions
///
/// /players/{id}/connect                     presence (POST)
/// /players/{id}/disconnect                  presence (POST)
/// /players/{id}/respawn                     auto-kit grant (POST)
/// /players/{id}/autokits/toggle             opt in/out (POST)
/// /players/{id}/kits/{name}/claim           player claim (POST)
/// /players/{id}/kits/{name}/give            administrative give (POST)
/// /players/{id}/kits/{name}/usage           get, set usage count
/// /players/{id}/kits/{name}/cooldown        get, set remaining cooldown
///
/// /admin/status                             service status
/// /admin/catalog/sync                       manual sync (POST)
/// /admin/catalog/status                     sync state
/// /admin/ledger/save                        save now (POST)
/// /admin/ledger/sweep                       sweep now (POST)
/// /admin/wipe                               start a new wipe (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/kits", kits::router())
        .route("/permissions", get(handlers::kits::list_permissions))
        .nest("/players", players::router())
        .nest("/admin", admin::router())
}
