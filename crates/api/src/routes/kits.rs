use axum::routing::get;
use axum::Router;

use crate::handlers::kits;
use crate::state::AppState;

/// Kit catalog routes mounted at `/kits`.
///
/// ```text
/// GET /                  -> list_kits (?include_hidden=true)
/// GET /{name}            -> get_kit
/// GET /{name}/exists     -> kit_exists
/// GET /{name}/contents   -> kit_contents
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(kits::list_kits))
        .route("/{name}", get(kits::get_kit))
        .route("/{name}/exists", get(kits::kit_exists))
        .route("/{name}/contents", get(kits::kit_contents))
}
