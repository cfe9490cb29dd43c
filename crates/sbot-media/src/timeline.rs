//! Timeline composition: binding a fitted still image to narration.
//!
//! The clip duration is the audio duration exactly. Effects are applied
//! in a fixed order: scale/fit, zoom envelope, fade envelope, text
//! overlay. Audio gets its own fade envelope. The result is a filter
//! plan ready for encoding; nothing is persisted between compose and
//! encode.

use std::path::{Path, PathBuf};
use tracing::warn;

use sbot_models::{EffectsConfig, TargetFrame};

use crate::error::{MediaError, MediaResult};
use crate::fit::FitPlan;

/// A composed clip: one image track and one audio track with their
/// filter chains, ready for the encoder.
#[derive(Debug, Clone)]
pub struct ComposedClip {
    /// Background image path
    pub image: PathBuf,
    /// Narration audio path
    pub audio: PathBuf,
    /// Clip duration in seconds (equals the audio duration)
    pub duration_secs: f64,
    /// Frame rate
    pub fps: u32,
    fit_filter: Option<String>,
    zoom_filter: Option<String>,
    fade_filter: Option<String>,
    overlay_filter: Option<String>,
    audio_fade_filter: Option<String>,
}

impl ComposedClip {
    /// Assemble the video filter chain, optionally without the overlay.
    ///
    /// The overlay is the only element that can fail at render time
    /// (missing font); the encoder retries without it.
    pub fn video_filter(&self, include_overlay: bool) -> Option<String> {
        let parts: Vec<&str> = [
            self.fit_filter.as_deref(),
            self.zoom_filter.as_deref(),
            self.fade_filter.as_deref(),
            if include_overlay {
                self.overlay_filter.as_deref()
            } else {
                None
            },
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }

    /// The audio filter chain, if any fades apply.
    pub fn audio_filter(&self) -> Option<&str> {
        self.audio_fade_filter.as_deref()
    }

    /// Whether a text overlay is part of this clip.
    pub fn has_overlay(&self) -> bool {
        self.overlay_filter.is_some()
    }
}

/// Composes fitted images and narration into timed clips.
#[derive(Debug, Clone)]
pub struct TimelineComposer {
    frame: TargetFrame,
    effects: EffectsConfig,
}

impl TimelineComposer {
    /// Create a composer for a fixed frame and effect set.
    pub fn new(frame: TargetFrame, effects: EffectsConfig) -> Self {
        Self { frame, effects }
    }

    /// Compose a clip from a fitted image and a probed audio duration.
    pub fn compose(
        &self,
        fit: &FitPlan,
        image: impl AsRef<Path>,
        audio: impl AsRef<Path>,
        audio_duration_secs: f64,
    ) -> MediaResult<ComposedClip> {
        if audio_duration_secs <= 0.0 {
            return Err(MediaError::invalid_media(format!(
                "Non-positive clip duration {:.3}s",
                audio_duration_secs
            )));
        }

        let duration = audio_duration_secs;
        if duration > self.frame.max_duration_secs {
            warn!(
                "Narration runs {:.1}s, past the {:.0}s target cap",
                duration, self.frame.max_duration_secs
            );
        }

        let zoom_filter = self
            .effects
            .zoom_applies(duration)
            .then(|| zoom_filter(&self.frame, self.effects.zoom_factor, duration));

        let video_fade = effective_fade(self.effects.video_fade_secs, duration);
        let audio_fade = effective_fade(self.effects.audio_fade_secs, duration);

        let overlay_filter = self
            .effects
            .overlay_text
            .as_deref()
            .map(|text| overlay_filter(text));

        Ok(ComposedClip {
            image: image.as_ref().to_path_buf(),
            audio: audio.as_ref().to_path_buf(),
            duration_secs: duration,
            fps: self.frame.fps,
            fit_filter: fit.to_filter(),
            zoom_filter,
            fade_filter: fade_filter("fade", video_fade, duration),
            overlay_filter,
            audio_fade_filter: fade_filter("afade", audio_fade, duration),
        })
    }
}

/// Clamp a fade so in and out never overlap: each side gets at most
/// half the clip.
fn effective_fade(requested_secs: f64, duration_secs: f64) -> f64 {
    requested_secs.min(duration_secs / 2.0).max(0.0)
}

/// Build a symmetric in/out fade chain for `fade` or `afade`.
fn fade_filter(kind: &str, fade_secs: f64, duration_secs: f64) -> Option<String> {
    if fade_secs <= 0.0 {
        return None;
    }
    Some(format!(
        "{kind}=t=in:st=0:d={fade:.3},{kind}=t=out:st={out_start:.3}:d={fade:.3}",
        kind = kind,
        fade = fade_secs,
        out_start = duration_secs - fade_secs,
    ))
}

/// Continuous linear zoom toward the image center.
///
/// `zoompan` evaluates once per output frame, so the scale factor is
/// `1 + k * frame/total_frames`, the per-frame form of
/// `1 + k * t/duration`.
fn zoom_filter(frame: &TargetFrame, zoom_factor: f64, duration_secs: f64) -> String {
    let total_frames = ((duration_secs * f64::from(frame.fps)).ceil() as u64).max(1);
    format!(
        "zoompan=z='1+{k}*on/{n}':d={n}:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={size}:fps={fps}",
        k = zoom_factor,
        n = total_frames,
        size = frame.size_arg(),
        fps = frame.fps,
    )
}

/// Bottom-center text overlay for the full clip duration.
fn overlay_filter(text: &str) -> String {
    format!(
        "drawtext=text='{}':fontcolor=white:fontsize=54:borderw=2:bordercolor=black:\
         x=(w-text_w)/2:y=h-text_h-120",
        escape_drawtext(text)
    )
}

/// Escape characters that are significant inside a drawtext argument.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
        .replace(',', "\\,")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_dimensions;

    fn composer(effects: EffectsConfig) -> TimelineComposer {
        TimelineComposer::new(TargetFrame::shorts(), effects)
    }

    fn plan() -> FitPlan {
        fit_dimensions(4000, 3000, &TargetFrame::shorts()).unwrap()
    }

    #[test]
    fn test_duration_equals_audio_duration() {
        let clip = composer(EffectsConfig::default())
            .compose(&plan(), "bg.jpg", "voice.mp3", 42.3)
            .unwrap();
        assert!((clip.duration_secs - 42.3).abs() < 1e-9);
        assert_eq!(clip.fps, 30);
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let err = composer(EffectsConfig::default())
            .compose(&plan(), "bg.jpg", "voice.mp3", 0.0)
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }

    #[test]
    fn test_effect_order_fit_zoom_fade_overlay() {
        let effects = EffectsConfig::default().with_zoom().with_overlay("Bridges");
        let clip = composer(effects)
            .compose(&plan(), "bg.jpg", "voice.mp3", 42.3)
            .unwrap();

        let filter = clip.video_filter(true).unwrap();
        let scale = filter.find("scale=").unwrap();
        let zoom = filter.find("zoompan=").unwrap();
        let fade = filter.find("fade=t=in").unwrap();
        let overlay = filter.find("drawtext=").unwrap();
        assert!(scale < zoom && zoom < fade && fade < overlay);
    }

    #[test]
    fn test_fades_never_exceed_half_duration() {
        // 0.6s clip: the 0.5s video fade clamps to 0.3s, audio to 0.2s
        let clip = composer(EffectsConfig::default())
            .compose(&plan(), "bg.jpg", "voice.mp3", 0.6)
            .unwrap();

        let video = clip.video_filter(true).unwrap();
        assert!(video.contains("fade=t=in:st=0:d=0.300"));
        assert!(video.contains("fade=t=out:st=0.300:d=0.300"));

        let audio = clip.audio_filter().unwrap();
        assert!(audio.contains("afade=t=in:st=0:d=0.200"));
        assert!(audio.contains("afade=t=out:st=0.400:d=0.200"));
    }

    #[test]
    fn test_fade_out_starts_at_duration_minus_fade() {
        let clip = composer(EffectsConfig::default())
            .compose(&plan(), "bg.jpg", "voice.mp3", 42.3)
            .unwrap();
        let video = clip.video_filter(true).unwrap();
        assert!(video.contains("fade=t=out:st=41.800:d=0.500"));
    }

    #[test]
    fn test_zoom_absent_below_minimum_duration() {
        let effects = EffectsConfig::default().with_zoom();
        let clip = composer(effects)
            .compose(&plan(), "bg.jpg", "voice.mp3", 4.0)
            .unwrap();
        assert!(!clip.video_filter(true).unwrap().contains("zoompan"));
    }

    #[test]
    fn test_zoom_frame_count() {
        let effects = EffectsConfig::default().with_zoom();
        let clip = composer(effects)
            .compose(&plan(), "bg.jpg", "voice.mp3", 10.0)
            .unwrap();
        // 10s at 30fps is 300 frames
        assert!(clip.video_filter(true).unwrap().contains("on/300"));
    }

    #[test]
    fn test_overlay_dropped_on_request() {
        let effects = EffectsConfig::default().with_overlay("Amazing facts");
        let clip = composer(effects)
            .compose(&plan(), "bg.jpg", "voice.mp3", 30.0)
            .unwrap();
        assert!(clip.has_overlay());
        assert!(clip.video_filter(true).unwrap().contains("drawtext"));
        assert!(!clip.video_filter(false).unwrap().contains("drawtext"));
    }

    #[test]
    fn test_drawtext_escaping() {
        assert_eq!(escape_drawtext("it's 100%"), "it\\'s 100\\%");
        assert_eq!(escape_drawtext("a:b,c"), "a\\:b\\,c");
    }

    #[test]
    fn test_exact_fit_with_no_effects_has_no_video_filter() {
        let exact = fit_dimensions(1080, 1920, &TargetFrame::shorts()).unwrap();
        let mut effects = EffectsConfig::default();
        effects.video_fade_secs = 0.0;
        effects.audio_fade_secs = 0.0;
        let clip = composer(effects)
            .compose(&exact, "bg.jpg", "voice.mp3", 12.0)
            .unwrap();
        assert!(clip.video_filter(true).is_none());
        assert!(clip.audio_filter().is_none());
    }
}
