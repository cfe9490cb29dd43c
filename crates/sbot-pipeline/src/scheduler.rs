//! Daily schedule loop.
//!
//! Temp paths are fixed, so concurrent runs on one host would corrupt
//! each other's artifacts; driving every run from this single loop
//! serializes them by construction.

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::pipeline::{summarize, Pipeline};

/// Topics rotated through when no explicit list is configured.
pub fn default_topics() -> Vec<String> {
    [
        "Why bridges have expansion joints",
        "How skyscrapers stay upright in wind",
        "The engineering behind tunnels",
        "Why roads crack in winter",
        "How elevators work safely",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Runs the pipeline once a day at a fixed local time.
pub struct Scheduler {
    pipeline: Pipeline,
    at: NaiveTime,
    topics: Vec<String>,
}

impl Scheduler {
    /// Create a scheduler firing daily at `at`, rotating `topics`.
    pub fn new(pipeline: Pipeline, at: NaiveTime, topics: Vec<String>) -> Self {
        let topics = if topics.is_empty() {
            default_topics()
        } else {
            topics
        };
        Self {
            pipeline,
            at,
            topics,
        }
    }

    /// Sleep until the next firing time, run, repeat.
    pub async fn run_forever(&self) {
        let mut index = 0usize;

        loop {
            let now = chrono::Local::now().naive_local();
            let delay = delay_until_next(now, self.at);
            info!(
                "Next scheduled run in {}h{:02}m",
                delay.num_hours(),
                delay.num_minutes() % 60
            );

            tokio::time::sleep(delay.to_std().unwrap_or_default()).await;

            let topic = &self.topics[index % self.topics.len()];
            info!("Running scheduled pipeline for topic: {}", topic);

            let report = self.pipeline.run(Some(topic)).await;
            if report.is_success() {
                info!("{}", summarize(&report));
            } else {
                // A failed scheduled run is logged and the loop carries
                // on to the next day.
                warn!("{}", summarize(&report));
            }

            index += 1;
        }
    }
}

/// Time until the next occurrence of `at`, strictly in the future.
fn delay_until_next(now: NaiveDateTime, at: NaiveTime) -> ChronoDuration {
    let mut target = now.date().and_time(at);
    if target <= now {
        target = target + ChronoDuration::days(1);
    }
    target - now
}
