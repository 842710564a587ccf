//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing).

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/propagate", post(handlers::propagate))
        .route("/objects/{object_id}/positions", get(handlers::get_positions))
        .route("/positions/stream", get(handlers::stream_positions))
        .route("/visibility", post(handlers::check_visibility))
        .route("/visibility/{requester_id}", get(handlers::get_visibility_results))
        .route("/jobs/{job_id}", get(handlers::get_job_status))
        .route("/element-updates", post(handlers::publish_element_update))
        .route(
            "/visibility-requests/{requester_id}",
            post(handlers::publish_visibility_requests),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
