//! Error types for configuration storage.

use std::path::Path;
use thiserror::Error;

use crate::model::ValidationError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or renaming a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored document is not valid JSON for the schema
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but breaks a schema rule
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

impl StoreError {
    pub(super) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(super) fn json(path: &Path, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.display().to_string(),
            source,
        }
    }
}
