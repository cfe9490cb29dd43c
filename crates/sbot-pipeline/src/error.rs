//! Pipeline error types.
//!
//! Recoverable upstream failures (short script, missing publish
//! credentials) are absorbed at the stage boundary and never become a
//! `PipelineError`; everything here is fatal and carries the stage it
//! originated from.

use std::path::PathBuf;
use thiserror::Error;

use sbot_models::Stage;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: Stage, message: String },

    #[error("{stage} artifact missing after stage: {path}")]
    ArtifactMissing { stage: Stage, path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Wrap any stage error with its originating stage.
    pub fn stage_failed(stage: Stage, err: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// A stage postcondition (artifact on storage) does not hold.
    pub fn artifact_missing(stage: Stage, path: impl Into<PathBuf>) -> Self {
        Self::ArtifactMissing {
            stage,
            path: path.into(),
        }
    }

    /// The stage this error originated from, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } | Self::ArtifactMissing { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context_attached() {
        let err = PipelineError::stage_failed(Stage::Voice, "synthesis returned nothing");
        assert_eq!(err.stage(), Some(Stage::Voice));
        assert!(err.to_string().contains("voice stage failed"));
    }

    #[test]
    fn test_artifact_missing_names_path() {
        let err = PipelineError::artifact_missing(Stage::Video, "temp/short.mp4");
        assert!(err.to_string().contains("temp/short.mp4"));
        assert_eq!(err.stage(), Some(Stage::Video));
    }
}
