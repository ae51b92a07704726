use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware as mw, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::endpoints::{canvas, config, schedule, status};
use crate::server::middleware::request_id;
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router, with every endpoint under `/api`.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Endpoints that read or replace the stored configuration
    let stored_router = Router::new()
        .route("/config", get(config::get_config).post(config::post_config))
        .route("/next", get(schedule::get_next))
        .route("/today", get(schedule::get_today))
        .route("/week", get(schedule::get_week))
        .route("/sync/canvas", post(canvas::post_sync_canvas));

    // Endpoints that work only on the request body
    let compute_router = Router::new()
        .route("/compute/next", post(schedule::post_compute_next))
        .route("/compute/today", post(schedule::post_compute_today))
        .route("/canvas/import", post(canvas::post_canvas_import));

    let api_router = Router::new()
        .route("/health", get(status::get_health))
        .merge(stored_router)
        .merge(compute_router);

    Router::new()
        .nest("/api", api_router)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(mw::from_fn(request_id::assign_request_id))
}
