//! Pipeline orchestration for topic-to-short-video runs.
//!
//! This crate provides:
//! - The run configuration (fixed temp layout, frame, effects, flags)
//! - The stage state machine with fallback and cleanup semantics
//! - The FFmpeg-backed renderer for the composite stage
//! - Unconditional, idempotent temp cleanup
//! - A daily scheduler that serializes repeated runs

pub mod cleanup;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod renderer;
pub mod scheduler;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use pipeline::Pipeline;
pub use renderer::{FfmpegRenderer, Renderer};
pub use scheduler::Scheduler;
