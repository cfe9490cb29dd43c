//! Error types for provider operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from external collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Generated script too short ({chars} chars)")]
    ScriptTooShort { chars: usize },

    #[error("No results for query: {0}")]
    EmptyResult(String),

    #[error("Expected artifact missing: {0}")]
    ArtifactMissing(PathBuf),

    #[error("Credentials not available: {0}")]
    CredentialsMissing(String),

    #[error("Media error: {0}")]
    Media(#[from] sbot_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API error from a status and response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Whether the publish precondition (stored credentials) is the
    /// problem; this degrades to "skip publish" rather than failing a run.
    pub fn is_credentials_missing(&self) -> bool {
        matches!(self, Self::CredentialsMissing(_))
    }
}
