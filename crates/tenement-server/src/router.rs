//! Router configuration and route composition.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use tenement_core::traits::TenementStore;

use crate::handlers::{health, progress, sync};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// `cors_origins` is `"*"` or a comma-separated list of origins.
pub fn create_router<S: TenementStore + 'static>(state: AppState<S>, cors_origins: &str) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check::<S>))
        .route("/sync/all", post(sync::sync_all::<S>))
        .route("/sync/:jurisdiction", post(sync::sync_jurisdiction::<S>))
        .route(
            "/sync-progress/:jurisdiction",
            get(progress::get_progress::<S>).post(progress::set_progress::<S>),
        );

    Router::new()
        .merge(api_routes)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Middleware layers (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

/// Build CORS layer from configuration.
///
/// If `origins` is "*", allows any origin (for development).
/// Otherwise, parses comma-separated origins.
fn build_cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(allowed)
    }
}
