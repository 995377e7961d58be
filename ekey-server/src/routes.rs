//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    delete_mapping_handler, get_mapping_handler, get_state_handler, health, list_states_handler,
    notification_handler, put_mapping_handler, ready,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &Config::default())
}

/// Create the application router with custom configuration
pub fn create_router_with_config(state: AppState, config: &Config) -> Router {
    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_kb * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    if state.secret_token.is_some() {
        tracing::info!("Authentication: bearer token required");
    } else {
        tracing::warn!("Authentication: DISABLED, no secret token configured");
    }

    // Base router with common layers
    let router = Router::new()
        .route("/api/notification/finger", post(notification_handler))
        .route("/", post(notification_handler))
        .route(
            "/api/mapping",
            get(get_mapping_handler)
                .put(put_mapping_handler)
                .delete(delete_mapping_handler),
        )
        .route("/api/states", get(list_states_handler))
        .route("/api/states/{entity_id}", get(get_state_handler))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(body_limit)
        .layer(timeout);

    // Conditionally apply rate limiting (disabled in tests)
    if config.rate_limit_enabled {
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_sec)
            .burst_size(config.rate_limit_burst)
            .finish();

        match governor_conf {
            Some(governor_conf) => {
                tracing::info!(
                    "Rate limiting: {} req/s (burst: {})",
                    config.rate_limit_per_sec,
                    config.rate_limit_burst
                );
                return router
                    .layer(GovernorLayer::new(Arc::new(governor_conf)))
                    .layer(TraceLayer::new_for_http());
            }
            None => {
                tracing::error!(
                    per_sec = config.rate_limit_per_sec,
                    burst = config.rate_limit_burst,
                    "Invalid rate limit settings, rate limiting DISABLED"
                );
            }
        }
    } else {
        tracing::warn!("Rate limiting: DISABLED");
    }

    router.layer(TraceLayer::new_for_http())
}
