//! Read-only kit catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use kitforge_core::kit::{ItemSummary, KitDefinition};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::RequireApiToken;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListKitsQuery {
    /// Include kits flagged hidden (default: false).
    pub include_hidden: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct KitExists {
    pub name: String,
    pub exists: bool,
}

/// GET /kits
pub async fn list_kits(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Query(query): Query<ListKitsQuery>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let names = state
        .service
        .lock()
        .await
        .kit_names(query.include_hidden.unwrap_or(false))?;
    Ok(Json(DataResponse { data: names }))
}

/// GET /kits/{name}
pub async fn get_kit(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<KitDefinition>>> {
    let kit = state.service.lock().await.kit_definition(&name)?;
    Ok(Json(DataResponse {
        data: KitDefinition::clone(&kit),
    }))
}

/// GET /kits/{name}/exists
pub async fn kit_exists(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<KitExists>>> {
    let exists = state.service.lock().await.kit_exists(&name)?;
    Ok(Json(DataResponse {
        data: KitExists { name, exists },
    }))
}

/// GET /kits/{name}/contents
///
/// Flattened item listing, nested contents included.
pub async fn kit_contents(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<Vec<ItemSummary>>>> {
    let contents = state.service.lock().await.kit_contents(&name)?;
    Ok(Json(DataResponse { data: contents }))
}

/// GET /permissions
///
/// Every permission registered from the catalog since startup.
pub async fn list_permissions(
    State(state): State<AppState>,
    _auth: RequireApiToken,
) -> Json<DataResponse<Vec<String>>> {
    let permissions = state.service.lock().await.permissions();
    Json(DataResponse { data: permissions })
}
