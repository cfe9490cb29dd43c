//! Fixed output frame configuration.

use serde::{Deserialize, Serialize};

/// Default output width (9:16 portrait)
pub const DEFAULT_WIDTH: u32 = 1080;
/// Default output height
pub const DEFAULT_HEIGHT: u32 = 1920;
/// Default frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default maximum clip duration in seconds
pub const DEFAULT_MAX_DURATION_SECS: f64 = 60.0;

/// The fixed output frame every clip is rendered against.
///
/// Constructed once at process start and passed into each component;
/// never mutated at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetFrame {
    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Frame rate (fps)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Maximum clip duration in seconds
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_max_duration() -> f64 {
    DEFAULT_MAX_DURATION_SECS
}

impl Default for TargetFrame {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

impl TargetFrame {
    /// Standard 1080x1920 @ 30fps shorts frame.
    pub fn shorts() -> Self {
        Self::default()
    }

    /// Frame size as an FFmpeg `WxH` string.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Width-to-height aspect ratio.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorts_frame() {
        let frame = TargetFrame::shorts();
        assert_eq!(frame.width, 1080);
        assert_eq!(frame.height, 1920);
        assert_eq!(frame.fps, 30);
        assert_eq!(frame.size_arg(), "1080x1920");
    }

    #[test]
    fn test_aspect() {
        let frame = TargetFrame::shorts();
        assert!((frame.aspect() - 0.5625).abs() < 1e-9);
    }
}
