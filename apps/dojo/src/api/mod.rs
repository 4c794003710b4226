//! # Dojo HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Roster and ledger counts
//! - `GET /members` - List members (`?all=true` includes inactive)
//! - `GET /members/{id}` - One member
//! - `GET /members/{id}/eligibility` - Exam readiness (`?today=YYYY-MM-DD`)
//! - `GET /members/{id}/stickers` - Sticker position
//! - `POST /members/{id}/award` - Award the next due sticker
//! - `POST /attendance` - Record attendance for a day
//! - `POST /export` - Binary snapshot, base64 encoded
//!
//! ## Security Configuration
//!
//! - `DOJO_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `server.rate_limit`: Requests per second (0 disables)
//! - `auth.admin_password`: If set, requires Bearer authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{AdminPassword, secrets_match};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ApiError, AttendanceRequest, AttendanceResponse, AwardRequest, AwardResponse,
    EligibilityResponse, ErrorResponse, ExportResponse, HealthResponse, MemberJson,
    StatusResponse, StickerResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use dojo_core::{Dojo, DojoError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub dojo: Arc<RwLock<Dojo>>,
    admin_password: Option<AdminPassword>,
    rate_limit: u32,
}

impl AppState {
    /// State without authentication or rate limiting.
    #[must_use]
    pub fn new(dojo: Dojo) -> Self {
        Self {
            dojo: Arc::new(RwLock::new(dojo)),
            admin_password: None,
            rate_limit: 0,
        }
    }

    /// Require `password` on every endpoint but `/health`. Empty disables.
    #[must_use]
    pub fn with_admin_password(mut self, password: Option<&str>) -> Self {
        self.admin_password = password.filter(|p| !p.is_empty()).map(Arc::from);
        self
    }

    /// Requests per second, 0 disables.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit = requests_per_second;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Build the CORS layer from a `DOJO_CORS_ORIGINS` value.
///
/// - `"*"`: any origin
/// - comma-separated list: those origins
/// - unset or nothing valid: localhost only
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (DOJO_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => Some(hv),
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();
            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in DOJO_CORS_ORIGINS, using localhost");
                build_localhost_cors()
            } else {
                tracing::info!("CORS: Allowing {} origin(s)", allowed.len());
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Rate Limiting (if enabled)
/// 4. Authentication (if an admin password is set)
pub fn create_router(state: AppState) -> Router {
    let cors_origins = std::env::var("DOJO_CORS_ORIGINS").ok();
    let cors = build_cors_layer(cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/members", get(handlers::members_handler))
        .route("/members/{id}", get(handlers::member_handler))
        .route(
            "/members/{id}/eligibility",
            get(handlers::eligibility_handler),
        )
        .route("/members/{id}/stickers", get(handlers::stickers_handler))
        .route("/members/{id}/award", post(handlers::award_handler))
        .route("/attendance", post(handlers::attendance_handler))
        .route("/export", post(handlers::export_handler));

    match &state.admin_password {
        Some(password) => {
            tracing::info!("Admin password authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                Arc::clone(password),
                auth::admin_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "Authentication DISABLED - set auth.admin_password or DOJO_ADMIN_PASSWORD"
            );
        }
    }

    match create_rate_limiter(state.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", state.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), DojoError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DojoError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Dojo HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| DojoError::IoError(format!("Server error: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_disables_auth() {
        let state = AppState::new(Dojo::new()).with_admin_password(Some(""));
        assert!(state.admin_password.is_none());
        let state = state.with_admin_password(Some("kiai"));
        assert_eq!(state.admin_password.as_deref(), Some("kiai"));
    }

    #[tokio::test]
    async fn health_stays_open_behind_auth() {
        use axum::{body::Body, http::Request, http::StatusCode};
        use tower::ServiceExt;

        let state = AppState::new(Dojo::new()).with_admin_password(Some("kiai"));
        let router = create_router(state);

        let health = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(health).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let status = Request::builder()
            .uri("/status")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(status).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
