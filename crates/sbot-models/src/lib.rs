//! Shared data models for the shorts pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The fixed output frame (dimensions, frame rate, duration cap)
//! - Encoding configuration
//! - Effect envelopes (fades, zoom, text overlay)
//! - Pipeline run identity, stages, and terminal reports
//! - Narration length policy

pub mod effects;
pub mod encoding;
pub mod frame;
pub mod narration;
pub mod run;

// Re-export common types
pub use effects::EffectsConfig;
pub use encoding::EncodingConfig;
pub use frame::TargetFrame;
pub use narration::{fallback_script, estimate_duration_secs, word_count};
pub use run::{PublishOutcome, RunId, RunReport, RunStatus, Stage};
