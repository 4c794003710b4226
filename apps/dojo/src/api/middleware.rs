//! # Middleware Module
//!
//! Global request rate limiting for the dojo HTTP API.
//!
//! The limit comes from `server.rate_limit` (or `DOJO_RATE_LIMIT`) in
//! requests per second; 0 turns the limiter off.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared, unkeyed rate limiter.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a limiter allowing `requests_per_second`, or `None` for 0.
pub fn create_rate_limiter(requests_per_second: u32) -> Option<GlobalRateLimiter> {
    let rps = NonZeroU32::new(requests_per_second)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Reject requests over the limit with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limiter.check().is_ok() {
        return next.run(request).await;
    }
    tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse {
            code: "RATE_LIMITED".to_string(),
            error: "Too Many Requests".to_string(),
        }),
    )
        .into_response()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_first_request() {
        let limiter = create_rate_limiter(5).expect("enabled");
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn zero_disables_limiter() {
        assert!(create_rate_limiter(0).is_none());
    }

    #[test]
    fn burst_over_quota_is_rejected() {
        let limiter = create_rate_limiter(2).expect("enabled");
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
