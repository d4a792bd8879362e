//! # EduPlan HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /catalogs` - List known catalogs
//! - `GET /courses/{course_id}/subjects` - Subjects grouped by period
//! - `GET /users/{user_id}/profile` - Profile and selected catalog
//! - `PUT /users/{user_id}/profile` - Replace the profile
//! - `GET /users/{user_id}/progress[?course_id=]` - Recorded statuses
//! - `PUT /users/{user_id}/progress/{subject_id}` - Set or remove a status
//! - `DELETE /users/{user_id}/progress/{subject_id}[?course_id=]` - Remove a status
//! - `GET /users/{user_id}/plan` - Curriculum view of the profile's course
//! - `GET /users/{user_id}/courses/{course_id}/plan` - Curriculum view
//! - `GET /users/{user_id}/schedule` - Weekly schedule
//! - `PUT /users/{user_id}/schedule` - Write one schedule cell
//!
//! Security settings (API key, rate limit, CORS origins) come from
//! [`ServerConfig`](crate::config::ServerConfig).

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::ApiKey;
pub use handlers::status_for;
pub use middleware::create_rate_limiter;
pub use types::{
    CatalogListResponse, CatalogSummary, CourseQuery, HealthResponse, PeriodJson, PlanResponse,
    ProfileRequest, ProfileResponse, ProgressResponse, ScheduleRequest, ScheduleResponse,
    StatusRequest, SubjectsResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use eduplan_core::{Planner, PlannerError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<RwLock<Planner>>,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    /// State with default server settings: no API key, default rate limit.
    #[must_use]
    pub fn new(planner: Planner) -> Self {
        Self::with_config(planner, ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(planner: Planner, server: ServerConfig) -> Self {
        Self {
            planner: Arc::new(RwLock::new(planner)),
            server: Arc::new(server),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS];

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: any origin
/// - empty: localhost only
/// - otherwise: the listed origins; invalid entries are skipped
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
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
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if an API key is configured)
pub fn create_router(state: AppState) -> Router {
    let server = Arc::clone(&state.server);

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/catalogs", get(handlers::catalogs_handler))
        .route(
            "/courses/{course_id}/subjects",
            get(handlers::subjects_handler),
        )
        .route(
            "/users/{user_id}/profile",
            get(handlers::get_profile_handler).put(handlers::put_profile_handler),
        )
        .route(
            "/users/{user_id}/progress",
            get(handlers::get_progress_handler),
        )
        .route(
            "/users/{user_id}/progress/{subject_id}",
            axum::routing::put(handlers::put_progress_handler)
                .delete(handlers::delete_progress_handler),
        )
        .route("/users/{user_id}/plan", get(handlers::profile_plan_handler))
        .route(
            "/users/{user_id}/courses/{course_id}/plan",
            get(handlers::plan_handler),
        )
        .route(
            "/users/{user_id}/schedule",
            get(handlers::get_schedule_handler).put(handlers::put_schedule_handler),
        );

    match server.api_key() {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                ApiKey::new(key),
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "API key authentication DISABLED - all endpoints are publicly accessible! \
                 Set EDUPLAN_API_KEY to enable authentication."
            );
        }
    }

    match create_rate_limiter(server.rate_limit) {
        Some(limiter) => {
            tracing::info!(
                "Rate limiting enabled: {} requests/second",
                server.rate_limit
            );
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&server.cors_origins))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), PlannerError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PlannerError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("EduPlan HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| PlannerError::IoError(format!("Server error: {}", e)))
}
