//! The pipeline state machine.
//!
//! Stages run strictly in order (script, voice, image, video, publish)
//! with one transition function per stage, each returning `Result`. A
//! short or missing script and absent publish credentials are recovered;
//! a missing audio, image, or video artifact is fatal. Cleanup of the
//! fixed temp paths runs on every terminal state.

use chrono::Utc;
use std::path::PathBuf;

use sbot_models::narration::{estimate_duration_secs, fallback_script, word_count, MIN_SCRIPT_WORDS};
use sbot_models::{PublishOutcome, RunId, RunReport, RunStatus, Stage};
use sbot_providers::{
    ImageProvider, Publisher, ScriptProvider, TranslateTtsVoice, VoiceProvider, YouTubePublisher,
};

use crate::cleanup::{clean_temp_files, setup_directories};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::renderer::{FfmpegRenderer, Renderer};

/// Orchestrates one topic-to-video run at a time.
pub struct Pipeline {
    config: PipelineConfig,
    script: ScriptProvider,
    voice: Box<dyn VoiceProvider>,
    image: ImageProvider,
    renderer: Box<dyn Renderer>,
    publisher: Box<dyn Publisher>,
}

impl Pipeline {
    /// Build the production pipeline from environment configuration.
    pub fn from_env(config: PipelineConfig) -> Self {
        let script = ScriptProvider::from_env();
        let voice = TranslateTtsVoice::new(config.voice_language.clone());
        let image = ImageProvider::from_env(config.frame);
        let renderer = FfmpegRenderer::new(
            config.frame,
            config.effects.clone(),
            config.encoding.clone(),
        );
        let publisher = YouTubePublisher::new(config.credentials_dir.clone(), config.publish.clone());

        Self::new(
            config,
            script,
            Box::new(voice),
            image,
            Box::new(renderer),
            Box::new(publisher),
        )
    }

    /// Build from explicit collaborators (tests, custom wiring).
    pub fn new(
        config: PipelineConfig,
        script: ScriptProvider,
        voice: Box<dyn VoiceProvider>,
        image: ImageProvider,
        renderer: Box<dyn Renderer>,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            script,
            voice,
            image,
            renderer,
            publisher,
        }
    }

    /// Run the full pipeline for `topic` (or the configured default).
    ///
    /// Never panics on stage failure; the terminal status lands in the
    /// report and temp cleanup runs regardless of the outcome.
    pub async fn run(&self, topic: Option<&str>) -> RunReport {
        let topic = topic.unwrap_or(&self.config.default_topic).to_string();
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, &topic);
        logger.log_start();

        let outcome = self.execute(&topic, &logger).await;

        if self.config.clean_temp {
            clean_temp_files(&self.config).await;
        }

        let (status, publish, video_path) = match outcome {
            Ok((video, publish)) => {
                logger.log_completion(&format!("video at {}", video.display()));
                (
                    RunStatus::Succeeded,
                    publish,
                    Some(video.to_string_lossy().to_string()),
                )
            }
            Err(e) => {
                logger.log_failure(&e.to_string());
                let stage = e.stage().unwrap_or(Stage::Script);
                (
                    RunStatus::Failed {
                        stage,
                        reason: e.to_string(),
                    },
                    PublishOutcome::Disabled,
                    None,
                )
            }
        };

        RunReport {
            run_id,
            topic,
            status,
            publish,
            video_path,
            finished_at: Utc::now(),
        }
    }

    /// All mandatory transitions, in order.
    async fn execute(
        &self,
        topic: &str,
        logger: &RunLogger,
    ) -> PipelineResult<(PathBuf, PublishOutcome)> {
        setup_directories(&self.config).await?;

        let script = self.stage_script(topic, logger).await?;
        let audio = self.stage_voice(&script, logger).await?;
        let image = self.stage_image(topic, logger).await?;
        let video = self.stage_video(&image, &audio, logger).await?;
        let publish = self.stage_publish(&video, topic, logger).await?;

        Ok((video, publish))
    }

    /// Init -> ScriptReady. A missing or too-short script is recovered
    /// with the deterministic topic fallback, never fatal.
    async fn stage_script(&self, topic: &str, logger: &RunLogger) -> PipelineResult<String> {
        logger.log_progress(&format!("Generating script for topic: {topic}"));

        let script = match self.script.generate(topic).await {
            Ok(script) if word_count(&script) >= MIN_SCRIPT_WORDS => script,
            Ok(script) => {
                logger.log_recovered(&format!(
                    "script too short ({} words), using topic fallback",
                    word_count(&script)
                ));
                fallback_script(topic)
            }
            Err(e) => {
                logger.log_recovered(&format!("script generation failed ({e}), using topic fallback"));
                fallback_script(topic)
            }
        };

        logger.log_progress(&format!(
            "Script ready ({} words, ~{:.0}s narration)",
            word_count(&script),
            estimate_duration_secs(&script)
        ));
        Ok(script)
    }

    /// ScriptReady -> VoiceReady. No fallback voice; a missing audio
    /// artifact is fatal.
    async fn stage_voice(&self, script: &str, logger: &RunLogger) -> PipelineResult<PathBuf> {
        logger.log_progress("Converting script to voice");
        let audio = self.config.audio_path();

        self.voice
            .synthesize(script, &audio)
            .await
            .map_err(|e| PipelineError::stage_failed(Stage::Voice, e))?;

        if !audio.exists() {
            return Err(PipelineError::artifact_missing(Stage::Voice, audio));
        }

        logger.log_progress(&format!("Voice ready: {}", audio.display()));
        Ok(audio)
    }

    /// VoiceReady -> ImageReady. The provider's remote-vs-local fallback
    /// is opaque here; only a missing artifact is fatal.
    async fn stage_image(&self, topic: &str, logger: &RunLogger) -> PipelineResult<PathBuf> {
        logger.log_progress("Fetching background image");
        let image = self.config.image_path();

        self.image
            .fetch(topic, &image)
            .await
            .map_err(|e| PipelineError::stage_failed(Stage::Image, e))?;

        if !image.exists() {
            return Err(PipelineError::artifact_missing(Stage::Image, image));
        }

        logger.log_progress(&format!("Image ready: {}", image.display()));
        Ok(image)
    }

    /// ImageReady -> VideoReady. Fit, compose, encode; the video must
    /// exist with non-zero size afterwards.
    async fn stage_video(
        &self,
        image: &PathBuf,
        audio: &PathBuf,
        logger: &RunLogger,
    ) -> PipelineResult<PathBuf> {
        logger.log_progress("Creating video");
        let video = self.config.video_path();

        let duration = self
            .renderer
            .render(image, audio, &video)
            .await
            .map_err(|e| PipelineError::stage_failed(Stage::Video, e))?;

        let size = tokio::fs::metadata(&video).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(PipelineError::artifact_missing(Stage::Video, video));
        }

        logger.log_progress(&format!(
            "Video ready: {} ({:.1}s, {} bytes)",
            video.display(),
            duration,
            size
        ));
        Ok(video)
    }

    /// VideoReady -> Published. Disabled runs skip entirely; missing
    /// credentials degrade to a recovered skip; any other upload error
    /// is fatal.
    async fn stage_publish(
        &self,
        video: &PathBuf,
        topic: &str,
        logger: &RunLogger,
    ) -> PipelineResult<PublishOutcome> {
        if !self.config.upload_enabled {
            logger.log_progress("Skipping upload (disabled in config)");
            return Ok(PublishOutcome::Disabled);
        }

        logger.log_progress("Uploading video");
        let title = format!("{topic} - AI Generated Short");
        let description =
            format!("An AI-generated short video about {topic}\n\n#shorts #ai #automation");

        match self.publisher.upload(video, &title, &description).await {
            Ok(receipt) => {
                logger.log_progress(&format!("Uploaded as {}", receipt.video_id));
                Ok(PublishOutcome::Uploaded {
                    video_id: receipt.video_id,
                })
            }
            Err(e) if e.is_credentials_missing() => {
                logger.log_recovered(&format!("publish skipped: {e}"));
                Ok(PublishOutcome::Skipped {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(PipelineError::stage_failed(Stage::Publish, e)),
        }
    }
}

/// Human-readable one-line summary for the CLI.
pub fn summarize(report: &RunReport) -> String {
    match &report.status {
        RunStatus::Succeeded => {
            let publish = match &report.publish {
                PublishOutcome::Uploaded { video_id } => format!("published as {video_id}"),
                PublishOutcome::Skipped { reason } => format!("publish skipped ({reason})"),
                PublishOutcome::Disabled => "publish disabled".to_string(),
            };
            format!("Pipeline succeeded for '{}' ({})", report.topic, publish)
        }
        RunStatus::Failed { stage, reason } => {
            format!(
                "Pipeline failed for '{}' at {} stage: {}",
                report.topic, stage, reason
            )
        }
    }
}
