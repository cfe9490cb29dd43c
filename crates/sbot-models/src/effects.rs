//! Effect envelopes applied when compositing a still image with narration.

use serde::{Deserialize, Serialize};

/// Video fade-in/out duration in seconds
pub const DEFAULT_VIDEO_FADE_SECS: f64 = 0.5;
/// Audio fade-in/out duration in seconds
pub const DEFAULT_AUDIO_FADE_SECS: f64 = 0.2;
/// Linear zoom gain over the full clip (scale reaches 1 + k at the end)
pub const DEFAULT_ZOOM_FACTOR: f64 = 0.02;
/// Minimum clip duration before the zoom envelope kicks in
pub const DEFAULT_ZOOM_MIN_DURATION_SECS: f64 = 5.0;

/// Effect configuration for a composed clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Video fade-in/out duration (seconds, each side)
    #[serde(default = "default_video_fade")]
    pub video_fade_secs: f64,

    /// Audio fade-in/out duration (seconds, each side)
    #[serde(default = "default_audio_fade")]
    pub audio_fade_secs: f64,

    /// Whether the slow zoom envelope is applied
    #[serde(default)]
    pub zoom_enabled: bool,

    /// Zoom gain `k` in `scale(t) = 1 + k * t / duration`
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,

    /// Clips shorter than this never zoom
    #[serde(default = "default_zoom_min_duration")]
    pub zoom_min_duration_secs: f64,

    /// Optional text drawn bottom-center for the full clip
    #[serde(default)]
    pub overlay_text: Option<String>,
}

fn default_video_fade() -> f64 {
    DEFAULT_VIDEO_FADE_SECS
}
fn default_audio_fade() -> f64 {
    DEFAULT_AUDIO_FADE_SECS
}
fn default_zoom_factor() -> f64 {
    DEFAULT_ZOOM_FACTOR
}
fn default_zoom_min_duration() -> f64 {
    DEFAULT_ZOOM_MIN_DURATION_SECS
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            video_fade_secs: DEFAULT_VIDEO_FADE_SECS,
            audio_fade_secs: DEFAULT_AUDIO_FADE_SECS,
            zoom_enabled: false,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            zoom_min_duration_secs: DEFAULT_ZOOM_MIN_DURATION_SECS,
            overlay_text: None,
        }
    }
}

impl EffectsConfig {
    /// Enable the zoom envelope.
    pub fn with_zoom(mut self) -> Self {
        self.zoom_enabled = true;
        self
    }

    /// Set overlay text.
    pub fn with_overlay(mut self, text: impl Into<String>) -> Self {
        self.overlay_text = Some(text.into());
        self
    }

    /// Whether zoom applies at the given clip duration.
    pub fn zoom_applies(&self, duration_secs: f64) -> bool {
        self.zoom_enabled && duration_secs > self.zoom_min_duration_secs
    }
}
