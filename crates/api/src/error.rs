use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kitforge_claims::{ClaimDenial, DenialClass};
use kitforge_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ClaimDenial`] for refused
/// claims, and renders both as `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A claim the pipeline refused.
    #[error(transparent)]
    Denied(#[from] ClaimDenial),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{id}' not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Unavailable(msg) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Denied(denial) => return denial_response(denial),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Claim denials carry the player-facing text and, for time-based
/// denials, the seconds remaining.
fn denial_response(denial: &ClaimDenial) -> Response {
    let status = match denial.class() {
        DenialClass::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        DenialClass::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        DenialClass::Ineligible => StatusCode::CONFLICT,
    };

    let mut body = json!({
        "error": denial.to_string(),
        "code": denial.code(),
    });
    if let Some(remaining) = denial.remaining_secs() {
        body["remaining_secs"] = json!(remaining);
    }

    (status, axum::Json(body)).into_response()
}
