//! HTTP routes for Keyhole
//!
//! This module defines all HTTP endpoints exposed by the proxy.

pub mod metrics;
pub mod ping;
pub mod relay;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    config::Config,
    middleware::{auth::auth_middleware, rate_limiter::rate_limit_middleware},
    AppState,
};

/// Build the CORS layer from the configured origin setting
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins()
            .into_iter()
            .filter_map(|origin| match HeaderValue::from_str(&origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Middleware is applied in reverse order (last applied runs first)
    // So: auth runs first, then rate limiting. Route layers skip the 405 fallback
    let protected_routes = Router::new()
        .route("/api/openai", post(relay::relay_chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes - no auth, no rate limit
    let public_routes = Router::new()
        .route("/ping", get(ping::ping))
        .route("/metrics", get(metrics::prometheus_metrics));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
