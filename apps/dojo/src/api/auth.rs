//! # Authentication Module
//!
//! Admin password check for the dojo HTTP API.
//!
//! When `auth.admin_password` (or `DOJO_ADMIN_PASSWORD`) is set, every
//! request except `/health` must carry it:
//! ```text
//! Authorization: Bearer <admin-password>
//! ```

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The configured admin password.
pub type AdminPassword = Arc<str>;

/// Compare two secrets in constant time.
///
/// Both sides are padded to the same length first, so the comparison
/// does not leak the expected length.
pub fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}

/// Admin password middleware.
pub async fn admin_auth_middleware(
    State(expected): State<AdminPassword>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Health stays open for monitoring.
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(password) if secrets_match(password.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_password",
                "Authentication failed: invalid admin password"
            );
            unauthorized()
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            unauthorized()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
