use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::types::AppState;

/// GET /api/health
/// Liveness probe with the seconds elapsed since startup.
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/health");

    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "uptime": s.started_at.elapsed().as_secs(),
        })),
    )
        .into_response()
}
