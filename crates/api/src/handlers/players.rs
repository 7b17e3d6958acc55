//! Player-facing endpoints called by the game host.
//!
//! Claims and gives take the host's [`PlayerContext`] and answer with the
//! items the host should place.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use kitforge_claims::ClaimGrant;
use kitforge_core::error::CoreError;
use kitforge_core::types::{PlayerId, UnixSeconds};
use serde::{Deserialize, Serialize};

use crate::bridge::{HostBridge, Placement, PlayerContext};
use crate::error::AppResult;
use crate::middleware::auth::RequireApiToken;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub kit: String,
    pub message: String,
    pub total_uses: u32,
    /// `0` when the kit has no cooldown.
    pub cooldown_expiry: UnixSeconds,
    pub placements: Vec<Placement>,
}

impl ClaimResponse {
    fn new(grant: ClaimGrant, bridge: HostBridge) -> Self {
        Self {
            kit: grant.kit.name.clone(),
            message: grant.message(),
            total_uses: grant.usage.total_uses,
            cooldown_expiry: grant.usage.cooldown_expiry,
            placements: bridge.into_placements(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsageCount {
    pub player: PlayerId,
    pub kit: String,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct SetUsageCount {
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct CooldownRemaining {
    pub player: PlayerId,
    pub kit: String,
    pub remaining_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetCooldown {
    /// Zero or negative clears the cooldown.
    pub remaining_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct AutoKitsToggled {
    pub player: PlayerId,
    pub auto_kits: bool,
}

fn validate_kit_name(kit: &str) -> Result<(), CoreError> {
    if kit.trim().is_empty() {
        return Err(CoreError::Validation("kit name is required".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// POST /players/{id}/kits/{name}/claim
///
/// Player-initiated claim; rate limited.
pub async fn claim_kit(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
    Json(context): Json<PlayerContext>,
) -> AppResult<Json<DataResponse<ClaimResponse>>> {
    let mut bridge = HostBridge::new(player, context);
    let grant = state
        .service
        .lock()
        .await
        .claim_kit(&mut bridge, player, &kit, Utc::now())?;
    Ok(Json(DataResponse {
        data: ClaimResponse::new(grant, bridge),
    }))
}

/// POST /players/{id}/kits/{name}/give
///
/// Administrative give: skips auth level, permission and cooldowns.
pub async fn give_kit(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
    Json(context): Json<PlayerContext>,
) -> AppResult<Json<DataResponse<ClaimResponse>>> {
    let mut bridge = HostBridge::new(player, context);
    let grant = state
        .service
        .lock()
        .await
        .give_kit(&mut bridge, player, &kit, Utc::now())?;
    tracing::info!(player, kit = %grant.kit.name, "Kit given");
    Ok(Json(DataResponse {
        data: ClaimResponse::new(grant, bridge),
    }))
}

/// POST /players/{id}/respawn
///
/// Returns the granted auto-kit, or `null` when none applied.
pub async fn respawn(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(player): Path<PlayerId>,
    Json(context): Json<PlayerContext>,
) -> Json<DataResponse<Option<ClaimResponse>>> {
    let mut bridge = HostBridge::new(player, context);
    let grant = state
        .service
        .lock()
        .await
        .on_respawn(&mut bridge, player, Utc::now());
    Json(DataResponse {
        data: grant.map(|grant| ClaimResponse::new(grant, bridge)),
    })
}

/// POST /players/{id}/autokits/toggle
///
/// 503 while player data is still loading.
pub async fn toggle_auto_kits(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(player): Path<PlayerId>,
) -> AppResult<Json<DataResponse<AutoKitsToggled>>> {
    let auto_kits = state.service.lock().await.toggle_auto_kits(player)?;
    Ok(Json(DataResponse {
        data: AutoKitsToggled { player, auto_kits },
    }))
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// POST /players/{id}/connect
pub async fn connect(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(player): Path<PlayerId>,
) -> axum::http::StatusCode {
    state.service.lock().await.player_connected(player);
    axum::http::StatusCode::NO_CONTENT
}

/// POST /players/{id}/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path(player): Path<PlayerId>,
) -> axum::http::StatusCode {
    state.service.lock().await.player_disconnected(player);
    axum::http::StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Usage overrides
// ---------------------------------------------------------------------------

/// GET /players/{id}/kits/{name}/usage
pub async fn get_usage(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
) -> AppResult<Json<DataResponse<UsageCount>>> {
    validate_kit_name(&kit)?;
    let count = state.service.lock().await.usage_count(player, &kit)?;
    Ok(Json(DataResponse {
        data: UsageCount { player, kit, count },
    }))
}

/// PUT /players/{id}/kits/{name}/usage
///
/// 404 when the player has no record; records are never created here.
pub async fn set_usage(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
    Json(input): Json<SetUsageCount>,
) -> AppResult<Json<DataResponse<UsageCount>>> {
    validate_kit_name(&kit)?;
    state
        .service
        .lock()
        .await
        .set_usage_count(player, &kit, input.count)?;
    Ok(Json(DataResponse {
        data: UsageCount {
            player,
            kit,
            count: input.count,
        },
    }))
}

/// GET /players/{id}/kits/{name}/cooldown
pub async fn get_cooldown(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
) -> AppResult<Json<DataResponse<CooldownRemaining>>> {
    validate_kit_name(&kit)?;
    let remaining_secs = state
        .service
        .lock()
        .await
        .cooldown_remaining(player, &kit, Utc::now())?;
    Ok(Json(DataResponse {
        data: CooldownRemaining {
            player,
            kit,
            remaining_secs,
        },
    }))
}

/// PUT /players/{id}/kits/{name}/cooldown
pub async fn set_cooldown(
    State(state): State<AppState>,
    _auth: RequireApiToken,
    Path((player, kit)): Path<(PlayerId, String)>,
    Json(input): Json<SetCooldown>,
) -> AppResult<Json<DataResponse<CooldownRemaining>>> {
    validate_kit_name(&kit)?;
    state.service.lock().await.set_cooldown_remaining(
        player,
        &kit,
        input.remaining_secs,
        Utc::now(),
    )?;
    Ok(Json(DataResponse {
        data: CooldownRemaining {
            player,
            kit,
            remaining_secs: input.remaining_secs.max(0),
        },
    }))
}
