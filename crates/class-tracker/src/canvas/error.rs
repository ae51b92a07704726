//! Error types for the Canvas importer.

use thiserror::Error;

/// Errors that can occur while importing courses from Canvas.
#[derive(Debug, Error, Clone)]
pub enum CanvasError {
    /// Base URL or access token was not provided
    #[error("Canvas base URL and access token are required")]
    MissingCredentials,

    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Canvas answered with a non-success status
    #[error("Canvas API error {status}: {body}")]
    Api { status: u16, body: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl CanvasError {
    /// Returns true if Canvas rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CanvasError::Api { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for CanvasError {
    fn from(err: reqwest::Error) -> Self {
        CanvasError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CanvasError {
    fn from(err: url::ParseError) -> Self {
        CanvasError::UrlError {
            message: err.to_string(),
        }
    }
}
