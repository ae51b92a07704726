//! Course import from the Canvas LMS REST API.
//!
//! Canvas knows which courses a student is enrolled in but not when they
//! meet, so imported courses arrive without meetings or locations and are
//! filled in by hand afterwards.

mod error;

pub use error::CanvasError;

use regex::Regex;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::model::{Course, Location, Online};

/// Colors handed out to imported courses in order.
const PALETTE: [&str; 7] = [
    "#2563EB", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#84CC16",
];

const COURSES_PATH: &str = "/api/v1/courses";

static COURSE_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,}\s*\d{3,}").expect("course code pattern is valid"));
static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A course as returned by `GET /api/v1/courses`.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasCourse {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course_code: Option<String>,
}

/// Client for one Canvas instance and access token.
pub struct CanvasClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl CanvasClient {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, CanvasError> {
        if base_url.trim().is_empty() || access_token.trim().is_empty() {
            return Err(CanvasError::MissingCredentials);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CanvasError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url.trim())?,
            access_token: access_token.trim().to_string(),
        })
    }

    /// The active student enrollments query.
    pub fn courses_url(&self) -> Result<Url, CanvasError> {
        let mut url = self.base_url.join(COURSES_PATH)?;
        url.query_pairs_mut()
            .append_pair("enrollment_state", "active")
            .append_pair("enrollment_type", "student")
            .append_pair("include[]", "term")
            .append_pair("state[]", "available")
            .append_pair("state[]", "current");
        Ok(url)
    }

    /// Fetches the student's active courses and maps them to [`Course`]s.
    pub async fn fetch_courses(&self) -> Result<Vec<Course>, CanvasError> {
        let url = self.courses_url()?;
        info!(host = %self.base_url.host_str().unwrap_or_default(), "Fetching Canvas courses");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Canvas rejected course request");
            return Err(CanvasError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Vec<CanvasCourse> = response.json().await?;
        info!(count = raw.len(), "Received Canvas courses");

        Ok(to_courses(raw))
    }
}

/// Maps Canvas courses to unscheduled courses, cycling the color palette.
pub fn to_courses(raw: Vec<CanvasCourse>) -> Vec<Course> {
    raw.into_iter()
        .enumerate()
        .map(|(index, canvas)| {
            let code = canvas
                .course_code
                .filter(|code| !code.trim().is_empty())
                .or_else(|| extract_code(&canvas.name))
                .unwrap_or_else(|| format!("ID{}", canvas.id));

            Course {
                course_id: format!("canvas-{}", canvas.id),
                code,
                title: canvas.name,
                section: String::new(),
                color: PALETTE[index % PALETTE.len()].to_string(),
                instructors: Vec::new(),
                location_default: Some(Location::default()),
                meetings: Vec::new(),
                online: Online::default(),
                notes: String::new(),
            }
        })
        .collect()
}

/// Pulls a code like `CSE 110` off the front of a course name.
fn extract_code(name: &str) -> Option<String> {
    COURSE_CODE_REGEX
        .find(name)
        .map(|m| WHITESPACE_REGEX.replace(m.as_str(), " ").into_owned())
}
