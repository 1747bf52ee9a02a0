//! Route definitions for the API server

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // The dashboard front end may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Control initialization
        .route("/filters", get(handlers::get_filter_options))
        // Filter-and-aggregate
        .route(
            "/aggregations",
            get(handlers::get_default_aggregations).post(handlers::post_aggregations),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
