//! The composite stage: fit, compose, encode.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use sbot_media::{audio_duration, fit_image, Encoder, MediaResult, TimelineComposer};
use sbot_models::{EffectsConfig, EncodingConfig, TargetFrame};

/// Renders a background image plus narration into an encoded video.
///
/// The seam between the orchestrator and the media layer; tests drive
/// the state machine with a stub implementation.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Produce the video at `output`; returns the clip duration.
    async fn render(&self, image: &Path, audio: &Path, output: &Path) -> MediaResult<f64>;
}

/// FFmpeg-backed renderer: MediaFitter -> TimelineComposer -> Encoder.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    frame: TargetFrame,
    composer: TimelineComposer,
    encoder: Encoder,
}

impl FfmpegRenderer {
    /// Create a renderer from the fixed frame, effects, and encoding set.
    pub fn new(frame: TargetFrame, effects: EffectsConfig, encoding: EncodingConfig) -> Self {
        Self {
            frame,
            composer: TimelineComposer::new(frame, effects),
            encoder: Encoder::new(encoding),
        }
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(&self, image: &Path, audio: &Path, output: &Path) -> MediaResult<f64> {
        let duration = audio_duration(audio).await?;
        debug!("Narration runs {:.2}s", duration);

        let fit = fit_image(image, &self.frame)?;
        debug!("Fit plan: {:?}", fit.placement);

        let clip = self.composer.compose(&fit, image, audio, duration)?;
        self.encoder.encode(&clip, output).await?;

        Ok(duration)
    }
}

/// Quick sanity check that the toolchain is present before a run
/// spends money on script and voice calls.
pub fn check_toolchain() -> MediaResult<()> {
    sbot_media::check_ffmpeg()?;
    sbot_media::check_ffprobe()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbot_media::MediaError;

    #[tokio::test]
    async fn test_render_missing_audio_fails() {
        let renderer = FfmpegRenderer::new(
            TargetFrame::shorts(),
            EffectsConfig::default(),
            EncodingConfig::default(),
        );
        let err = renderer
            .render(
                Path::new("/nonexistent/bg.jpg"),
                Path::new("/nonexistent/narration.mp3"),
                Path::new("/tmp/out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MediaError::FileNotFound(_) | MediaError::FfprobeNotFound
        ));
    }
}
