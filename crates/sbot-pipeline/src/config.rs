//! Pipeline run configuration.
//!
//! Built once at process start and passed explicitly into each
//! component; no component reads ambient global state.

use std::path::PathBuf;

use sbot_models::{EffectsConfig, EncodingConfig, TargetFrame};
use sbot_providers::PublishSettings;

/// Audio artifact file name under the temp directory.
pub const TEMP_AUDIO_FILE: &str = "narration.mp3";
/// Image artifact file name under the temp directory.
pub const TEMP_IMAGE_FILE: &str = "background.jpg";
/// Video artifact file name under the temp directory.
pub const TEMP_VIDEO_FILE: &str = "short.mp4";

/// Configuration for pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Topic used when none is supplied
    pub default_topic: String,
    /// Directory for the fixed per-stage artifact paths
    pub temp_dir: PathBuf,
    /// Directory holding serialized publish credentials
    pub credentials_dir: PathBuf,
    /// Whether the publish stage runs at all
    pub upload_enabled: bool,
    /// Whether temp artifacts are removed at the end of a run
    pub clean_temp: bool,
    /// Narration language code
    pub voice_language: String,
    /// Output frame geometry
    pub frame: TargetFrame,
    /// Fixed encoder parameter set
    pub encoding: EncodingConfig,
    /// Effect envelopes
    pub effects: EffectsConfig,
    /// Upload metadata
    pub publish: PublishSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_topic: "Amazing engineering facts".to_string(),
            temp_dir: PathBuf::from("temp"),
            credentials_dir: PathBuf::from("credentials"),
            upload_enabled: false,
            clean_temp: true,
            voice_language: "en".to_string(),
            frame: TargetFrame::shorts(),
            encoding: EncodingConfig::default(),
            effects: EffectsConfig::default(),
            publish: PublishSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_topic: std::env::var("SBOT_DEFAULT_TOPIC")
                .unwrap_or(defaults.default_topic),
            temp_dir: std::env::var("SBOT_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            credentials_dir: std::env::var("SBOT_CREDENTIALS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_dir),
            upload_enabled: std::env::var("SBOT_UPLOAD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.upload_enabled),
            clean_temp: std::env::var("SBOT_CLEAN_TEMP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.clean_temp),
            voice_language: std::env::var("SBOT_VOICE_LANGUAGE")
                .unwrap_or(defaults.voice_language),
            frame: defaults.frame,
            encoding: defaults.encoding,
            effects: EffectsConfig {
                zoom_enabled: std::env::var("SBOT_ZOOM")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
                ..defaults.effects
            },
            publish: defaults.publish,
        }
    }

    /// Fixed audio artifact path.
    pub fn audio_path(&self) -> PathBuf {
        self.temp_dir.join(TEMP_AUDIO_FILE)
    }

    /// Fixed image artifact path.
    pub fn image_path(&self) -> PathBuf {
        self.temp_dir.join(TEMP_IMAGE_FILE)
    }

    /// Fixed video artifact path.
    pub fn video_path(&self) -> PathBuf {
        self.temp_dir.join(TEMP_VIDEO_FILE)
    }
}
