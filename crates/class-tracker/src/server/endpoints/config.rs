use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::model::Config;
use crate::server::types::ApiErrorType;
use crate::store::StoreError;
use crate::types::AppState;

/// GET /api/config
/// Returns the stored configuration document.
pub async fn get_config(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/config");

    match s.store.read() {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read config");
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read config",
                Some(e.to_string()),
            ))
            .into_response()
        }
    }
}

/// POST /api/config
/// Validates the body and replaces the stored configuration with it.
pub async fn post_config(
    State(s): State<Arc<AppState>>,
    body: Result<Json<Config>, JsonRejection>,
) -> Response {
    info!("POST /api/config");

    let Json(config) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Rejected config body");
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid config",
                Some(e.body_text()),
            ))
            .into_response();
        }
    };

    let _guard = s.write_lock.lock().await;
    match s.store.write(&config) {
        Ok(()) => {
            info!(courses = config.courses.len(), "Saved config");
            (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
        }
        Err(e) => store_error_to_response(e, "Failed to save config"),
    }
}

/// Validation failures are the caller's fault; anything else is ours.
pub(super) fn store_error_to_response(e: StoreError, message: &str) -> Response {
    match e {
        StoreError::Invalid(invalid) => {
            warn!(error = %invalid, "{}", message);
            ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid config",
                Some(invalid.to_string()),
            ))
            .into_response()
        }
        other => {
            error!(error = %other, "{}", message);
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                message,
                Some(other.to_string()),
            ))
            .into_response()
        }
    }
}
