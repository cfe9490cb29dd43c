//! Structured run logging.
//!
//! Consistent stage-by-stage progress lines with the run ID attached,
//! so a day of scheduled runs remains greppable.

use tracing::{error, info, warn, Span};

use sbot_models::RunId;

/// Run logger with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    topic: String,
}

impl RunLogger {
    /// Create a logger for one pipeline run.
    pub fn new(run_id: &RunId, topic: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            topic: topic.to_string(),
        }
    }

    /// Log the start of the run.
    pub fn log_start(&self) {
        info!(run_id = %self.run_id, topic = %self.topic, "Pipeline run started");
    }

    /// Log a stage-level progress update.
    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, "{}", message);
    }

    /// Log a recovered (non-fatal) failure.
    pub fn log_recovered(&self, message: &str) {
        warn!(run_id = %self.run_id, "Recovered: {}", message);
    }

    /// Log a fatal failure.
    pub fn log_failure(&self, message: &str) {
        error!(run_id = %self.run_id, "Run failed: {}", message);
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, "Run complete: {}", message);
    }

    /// Get the run ID.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, topic = %self.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "bridges");
        assert_eq!(logger.run_id(), run_id.to_string());
    }
}
