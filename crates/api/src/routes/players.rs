//! Player routes mounted at `/players`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::players;
use crate::state::AppState;

/// ```text
/// POST /{id}/connect                  -> connect
/// POST /{id}/disconnect               -> disconnect
/// POST /{id}/respawn                  -> respawn
/// POST /{id}/autokits/toggle          -> toggle_auto_kits
/// POST /{id}/kits/{name}/claim        -> claim_kit
/// POST /{id}/kits/{name}/give         -> give_kit
/// GET  /{id}/kits/{name}/usage        -> get_usage
/// PUT  /{id}/kits/{name}/usage        -> set_usage
/// GET  /{id}/kits/{name}/cooldown     -> get_cooldown
/// PUT  /{id}/kits/{name}/cooldown     -> set_cooldown
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/connect", post(players::connect))
        .route("/{id}/disconnect", post(players::disconnect))
        .route("/{id}/respawn", post(players::respawn))
        .route("/{id}/autokits/toggle", post(players::toggle_auto_kits))
        .route("/{id}/kits/{name}/claim", post(players::claim_kit))
        .route("/{id}/kits/{name}/give", post(players::give_kit))
        .route(
            "/{id}/kits/{name}/usage",
            get(players::get_usage).put(players::set_usage),
        )
        .route(
            "/{id}/kits/{name}/cooldown",
            get(players::get_cooldown).put(players::set_cooldown),
        )
}
