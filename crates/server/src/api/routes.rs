use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{artworks, audit, handlers, jobs, middleware, orders};
use crate::state::AppState;

/// Extra room for multipart framing around the configured upload cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config().upload.max_bytes + MULTIPART_OVERHEAD;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Artworks
        .route("/artworks", post(artworks::upload_artwork))
        .route("/artworks", get(artworks::list_artworks))
        .route("/artworks/{id}", get(artworks::get_artwork))
        .route("/artworks/{id}/template", get(artworks::get_template))
        .route("/artworks/{id}/process", post(artworks::process_artwork))
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/cancel", post(jobs::cancel_job))
        // Orders
        .route("/orders", post(orders::create_order))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/events", post(orders::apply_order_event));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(max_body))
}
