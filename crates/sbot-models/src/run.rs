//! Pipeline run identity, stages, and terminal reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage.
///
/// Stages execute in declaration order; each one consumes the previous
/// stage's artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Generate the narration script
    Script,
    /// Synthesize the narration audio
    Voice,
    /// Acquire the background image
    Image,
    /// Fit, compose, and encode the video
    Video,
    /// Upload the finished video
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Voice => "voice",
            Stage::Image => "image",
            Stage::Video => "video",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunStatus {
    /// Every mandatory stage completed
    Succeeded,
    /// A fatal failure aborted the run at `stage`
    Failed { stage: Stage, reason: String },
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded)
    }
}

/// Outcome of the optional publish stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PublishOutcome {
    /// Upload completed; `video_id` identifies the hosted video
    Uploaded { video_id: String },
    /// Publish was enabled but skipped (e.g. missing credentials)
    Skipped { reason: String },
    /// Publish was not enabled for this run
    Disabled,
}

/// Final report for a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,
    /// Topic the run was invoked with
    pub topic: String,
    /// Terminal status
    pub status: RunStatus,
    /// Publish outcome (meaningful only on success)
    pub publish: PublishOutcome,
    /// Output video path when the run succeeded
    pub video_path: Option<String>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Script.to_string(), "script");
        assert_eq!(Stage::Video.to_string(), "video");
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let status = RunStatus::Failed {
            stage: Stage::Voice,
            reason: "audio artifact missing".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"voice\""));
        let back: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
