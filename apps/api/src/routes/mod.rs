pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::Config;
use crate::intake::handlers;
use crate::state::AppState;

/// Upper bound for a whole `/contact` request. Leaves headroom above the
/// attachment limit so an oversize resume is reported as such.
pub const MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::liveness_handler))
        .route("/test", get(health::diagnostics_handler))
        .route(
            "/contact",
            post(handlers::handle_contact).layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES)),
        )
        .with_state(state)
}

/// Explicit allowlist when configured, otherwise any origin.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
