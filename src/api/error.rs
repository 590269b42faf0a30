// ABOUTME: Error types for control plane API calls.
// ABOUTME: Separates transport failures from HTTP status failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized; check HANGAR_ACCESS_TOKEN")]
    Unauthorized,

    #[error("API returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Map a non-success HTTP response to an error.
    pub fn from_status(status: u16, path: &str, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound(path.to_string()),
            _ => ApiError::Status {
                status,
                path: path.to_string(),
                body,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
