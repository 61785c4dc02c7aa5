#![allow(dead_code)]

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = cors_layer(&app_state.config);
    let progress_prefix = format!("{}/progress", app_state.config.api_v1_str);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest(&progress_prefix, progress_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn progress_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/{user_id}", get(handlers::progress::get_progress))
        .route(
            "/{user_id}/level/{level}",
            post(handlers::progress::update_level_progress),
        )
        .route(
            "/{user_id}/current-level",
            get(handlers::progress::get_current_level),
        )
}

/// CORS for the browser frontend: explicit origins from config, credentials
/// allowed (a wildcard origin is not valid with credentials).
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .backend_cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
