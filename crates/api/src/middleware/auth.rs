//! Shared-secret bearer check for the game host and admin tooling.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kitforge_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that passes only when the request carries
/// `Authorization: Bearer <API_TOKEN>`. With no token configured every
/// request passes.
///
/// ```ignore
/// async fn my_handler(_auth: RequireApiToken) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireApiToken;

impl FromRequestParts<AppState> for RequireApiToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_token.as_deref() else {
            return Ok(RequireApiToken);
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid API token".into(),
            )));
        }

        Ok(RequireApiToken)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
