use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::model::Config;
use crate::schedule::{self, ScheduleError};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// `?now=` override accepted by the schedule queries.
#[derive(Debug, Default, Deserialize)]
pub struct NowQuery {
    pub now: Option<String>,
}

/// Body of the compute endpoints: a configuration that is not stored.
#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub config: Config,
    #[serde(default)]
    pub now: Option<String>,
}

fn schedule_error_to_response(e: ScheduleError) -> Response {
    warn!(error = %e, "Rejected schedule query");
    let message = match &e {
        ScheduleError::InvalidReferenceInstant { .. } => "Invalid reference instant",
        ScheduleError::UnknownTimezone(_) => "Unknown timezone",
    };
    ApiErrorType::from((StatusCode::BAD_REQUEST, message, Some(e.to_string()))).into_response()
}

fn load_config(s: &AppState) -> Result<Config, Response> {
    s.store.read().map_err(|e| {
        error!(error = %e, "Failed to read config");
        ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read config",
            Some(e.to_string()),
        ))
        .into_response()
    })
}

/// Unwraps a compute body, validating the configuration it carries.
fn compute_request(body: Result<Json<ComputeRequest>, JsonRejection>) -> Result<ComputeRequest, Response> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "Rejected compute body");
        ApiErrorType::from((StatusCode::BAD_REQUEST, "Invalid request body", Some(e.body_text())))
            .into_response()
    })?;

    request.config.validate().map_err(|e| {
        warn!(error = %e, "Rejected compute config");
        ApiErrorType::from((StatusCode::BAD_REQUEST, "Invalid config", Some(e.to_string())))
            .into_response()
    })?;

    Ok(request)
}

fn next_response(s: &AppState, config: &Config, now: Option<&str>) -> Response {
    match schedule::resolve_next(config, now, s.fallback_zone) {
        // `null` when nothing is scheduled within the horizon
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => schedule_error_to_response(e),
    }
}

fn today_response(s: &AppState, config: &Config, now: Option<&str>) -> Response {
    match schedule::resolve_today(config, now, s.fallback_zone) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => schedule_error_to_response(e),
    }
}

/// GET /api/next
/// Returns the class in progress or the next one to start.
pub async fn get_next(State(s): State<Arc<AppState>>, Query(params): Query<NowQuery>) -> Response {
    info!("GET /api/next (now: {:?})", params.now);

    match load_config(&s) {
        Ok(config) => next_response(&s, &config, params.now.as_deref()),
        Err(response) => response,
    }
}

/// GET /api/today
/// Returns every class starting on the current local date.
pub async fn get_today(State(s): State<Arc<AppState>>, Query(params): Query<NowQuery>) -> Response {
    info!("GET /api/today (now: {:?})", params.now);

    match load_config(&s) {
        Ok(config) => today_response(&s, &config, params.now.as_deref()),
        Err(response) => response,
    }
}

/// GET /api/week
pub async fn get_week(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/week");

    match load_config(&s) {
        Ok(config) => (StatusCode::OK, Json(schedule::resolve_week(&config))).into_response(),
        Err(response) => response,
    }
}

/// POST /api/compute/next
/// Same as `/api/next`, against the configuration in the body.
pub async fn post_compute_next(
    State(s): State<Arc<AppState>>,
    body: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    info!("POST /api/compute/next");

    match compute_request(body) {
        Ok(request) => next_response(&s, &request.config, request.now.as_deref()),
        Err(response) => response,
    }
}

/// POST /api/compute/today
pub async fn post_compute_today(
    State(s): State<Arc<AppState>>,
    body: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    info!("POST /api/compute/today");

    match compute_request(body) {
        Ok(request) => today_response(&s, &request.config, request.now.as_deref()),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::endpoints::test_support::{body_json, state_in};
    use serde_json::json;

    fn cs101_config() -> Config {
        serde_json::from_value(json!({
            "data_source": { "mode": "manual", "manual": { "timezone": "America/New_York" } },
            "profile": { "student_name": "Ada" },
            "notifications": { "enabled": false },
            "ui": {},
            "courses": [{
                "course_id": "cs101",
                "code": "CS101",
                "title": "Intro",
                "location_default": { "building": "Hall", "room": "101" },
                "meetings": [{ "weekday": "mon", "start": "09:00", "end": "09:50" }]
            }]
        }))
        .unwrap()
    }

    fn now(value: &str) -> Query<NowQuery> {
        Query(NowQuery {
            now: Some(value.to_string()),
        })
    }

    fn stored_state(dir: &std::path::Path) -> Arc<AppState> {
        let state = state_in(dir);
        state.store.write(&cs101_config()).unwrap();
        state
    }

    #[test_log::test(tokio::test)]
    async fn test_next_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_next(State(stored_state(dir.path())), now("2024-01-07T23:00:00")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["next"]["course_code"], "CS101");
        assert_eq!(body["next"]["start"], "2024-01-08T09:00:00-05:00");
        assert_eq!(body["next"]["minutes_until"], 600);
        assert_eq!(body["next"]["status"], "upcoming");
        assert_eq!(body["next"]["location"]["building"], "Hall");
    }

    #[test_log::test(tokio::test)]
    async fn test_next_is_null_without_courses() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_next(State(state_in(dir.path())), now("2024-01-08T09:10:00")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.is_null());
    }

    #[test_log::test(tokio::test)]
    async fn test_bad_now_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_today(State(stored_state(dir.path())), now("yesterday")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid reference instant");
    }

    #[test_log::test(tokio::test)]
    async fn test_today_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_today(State(stored_state(dir.path())), now("2024-01-08T09:10:00")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["now"], "2024-01-08T09:10:00-05:00");
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["start"], "2024-01-08T09:00:00-05:00");
    }

    #[test_log::test(tokio::test)]
    async fn test_week_groups_by_weekday() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_week(State(stored_state(dir.path()))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["days"].as_array().unwrap().len(), 7);
    }

    #[test_log::test(tokio::test)]
    async fn test_compute_does_not_touch_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let request = ComputeRequest {
            config: cs101_config(),
            now: Some("2024-01-08T09:10:00".to_string()),
        };

        let response = post_compute_next(State(state.clone()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["next"]["status"], "in_progress");
        assert_eq!(body["next"]["minutes_until"], 0);

        assert!(state.store.read().unwrap().courses.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_compute_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = cs101_config();
        config.courses.push(config.courses[0].clone());
        let request = ComputeRequest { config, now: None };

        let response = post_compute_today(State(state_in(dir.path())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
