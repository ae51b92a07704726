use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::canvas::{CanvasClient, CanvasError};
use crate::model::{CanvasSource, DataSourceMode};
use crate::server::endpoints::config::store_error_to_response;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
}

/// Converts CanvasError to API response.
fn canvas_error_to_response(e: CanvasError) -> Response {
    let (status, message) = match &e {
        CanvasError::MissingCredentials => (StatusCode::BAD_REQUEST, "Missing Canvas credentials"),
        CanvasError::UrlError { .. } => (StatusCode::BAD_REQUEST, "Invalid Canvas URL"),
        CanvasError::Api { .. } if e.is_unauthorized() => {
            (StatusCode::BAD_GATEWAY, "Canvas rejected the access token")
        }
        CanvasError::Api { .. } => (StatusCode::BAD_GATEWAY, "Canvas request failed"),
        CanvasError::Network { .. } => (StatusCode::BAD_GATEWAY, "Could not reach Canvas"),
    };

    if status.is_server_error() {
        error!(error = %e, "{}", message);
    } else {
        warn!(error = %e, "{}", message);
    }
    ApiErrorType::from((status, message, Some(e.to_string()))).into_response()
}

/// POST /api/sync/canvas
/// Imports courses with the server's Canvas credentials and stores them,
/// switching the configuration to Canvas mode.
pub async fn post_sync_canvas(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /api/sync/canvas");

    let Some((base_url, access_token)) = s.settings.canvas.credentials() else {
        return canvas_error_to_response(CanvasError::MissingCredentials);
    };

    let courses = match CanvasClient::new(base_url, access_token) {
        Ok(client) => client.fetch_courses().await,
        Err(e) => Err(e),
    };
    let courses = match courses {
        Ok(courses) => courses,
        Err(e) => return canvas_error_to_response(e),
    };

    let _guard = s.write_lock.lock().await;
    let mut config = match s.store.read() {
        Ok(config) => config,
        Err(e) => return store_error_to_response(e, "Failed to read config"),
    };

    let imported = courses.len();
    config.data_source.mode = DataSourceMode::Canvas;
    config.data_source.canvas = Some(CanvasSource {
        base_url: base_url.trim().to_string(),
        // The token stays in the server settings
        access_token: None,
        sync: config
            .data_source
            .canvas
            .take()
            .map(|canvas| canvas.sync)
            .unwrap_or_default(),
    });
    config.courses = courses;

    match s.store.write(&config) {
        Ok(()) => {
            info!(imported, "Synced courses from Canvas");
            (StatusCode::OK, Json(json!({ "ok": true, "imported": imported }))).into_response()
        }
        Err(e) => store_error_to_response(e, "Failed to save config"),
    }
}

/// POST /api/canvas/import
/// Fetches courses with caller-supplied credentials without storing them.
pub async fn post_canvas_import(body: Result<Json<ImportRequest>, JsonRejection>) -> Response {
    info!("POST /api/canvas/import");

    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Rejected import body");
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                Some(e.body_text()),
            ))
            .into_response();
        }
    };

    let client = match CanvasClient::new(&request.base_url, &request.access_token) {
        Ok(client) => client,
        Err(e) => return canvas_error_to_response(e),
    };

    match client.fetch_courses().await {
        Ok(courses) => {
            info!(imported = courses.len(), "Imported courses from Canvas");
            (StatusCode::OK, Json(json!({ "courses": courses }))).into_response()
        }
        Err(e) => canvas_error_to_response(e),
    }
}
