//! Background image acquisition.
//!
//! Ordered strategy list: Pexels search and download, then a locally
//! rendered topic card (FFmpeg color source + drawtext), then a plain
//! solid canvas. The local tiers synthesize directly at the target frame
//! size, so the fitter passes their output through unchanged.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use sbot_media::{escape_drawtext, FfmpegCommand, FfmpegRunner};
use sbot_models::TargetFrame;

use crate::error::{ProviderError, ProviderResult};

/// Default per-request timeout for image calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pexels API base.
const PEXELS_BASE_URL: &str = "https://api.pexels.com";

/// Background color for synthesized cards (dark slate blue).
const CARD_COLOR: &str = "0x10243e";

/// A single way of producing a background image.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Human-readable strategy name for logging.
    fn name(&self) -> &'static str;

    /// Write a background image for `topic` exactly to `output_path`.
    async fn fetch(&self, topic: &str, output_path: &Path) -> ProviderResult<()>;
}

/// Ordered strategy list for image acquisition.
pub struct ImageProvider {
    sources: Vec<Box<dyn ImageSource>>,
}

impl ImageProvider {
    /// Build the standard chain for the given frame: Pexels when a key
    /// is configured, then the local synthesis tiers.
    pub fn from_env(frame: TargetFrame) -> Self {
        let mut sources: Vec<Box<dyn ImageSource>> = Vec::new();
        match PexelsImageSource::from_env() {
            Ok(pexels) => sources.push(Box::new(pexels)),
            Err(e) => warn!("Image search unavailable ({}), local synthesis only", e),
        }
        sources.push(Box::new(TopicCardImageSource::new(frame)));
        sources.push(Box::new(SolidCanvasImageSource::new(frame)));
        Self { sources }
    }

    /// Build from an explicit strategy list (tests, custom chains).
    pub fn new(sources: Vec<Box<dyn ImageSource>>) -> Self {
        Self { sources }
    }

    /// Fetch a background image, falling through the strategy list.
    /// Postcondition on success: a file exists at `output_path`.
    pub async fn fetch(&self, topic: &str, output_path: &Path) -> ProviderResult<()> {
        let mut last_error = None;

        for source in &self.sources {
            match source.fetch(topic, output_path).await {
                Ok(()) if output_path.exists() => {
                    info!("Background image produced by {}", source.name());
                    return Ok(());
                }
                Ok(()) => {
                    warn!("Image source {} reported success without output", source.name());
                    last_error = Some(ProviderError::ArtifactMissing(output_path.to_path_buf()));
                }
                Err(e) => {
                    warn!("Image source {} failed: {}", source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::config("No image sources configured")))
    }
}

// =============================================================================
// Pexels
// =============================================================================

#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    large: String,
}

/// Pexels stock-photo search and download.
pub struct PexelsImageSource {
    api_key: String,
    client: Client,
    base_url: String,
}

impl PexelsImageSource {
    /// Create from `PEXELS_API_KEY`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("PEXELS_API_KEY")
            .map_err(|_| ProviderError::config("PEXELS_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    /// Create with an explicit key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            base_url: PEXELS_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ImageSource for PexelsImageSource {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn fetch(&self, topic: &str, output_path: &Path) -> ProviderResult<()> {
        let url = format!("{}/v1/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", topic),
                ("per_page", "1"),
                ("orientation", "portrait"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let search: PexelsSearchResponse = response.json().await?;
        let photo = search
            .photos
            .first()
            .ok_or_else(|| ProviderError::EmptyResult(format!("No Pexels photos for '{topic}'")))?;

        info!("Downloading Pexels image for '{}'", topic);
        let image = self.client.get(&photo.src.large).send().await?;
        if !image.status().is_success() {
            return Err(ProviderError::api(image.status().as_u16(), "image download"));
        }
        let bytes = image.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyResult("Empty image download".to_string()));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(output_path, &bytes).await?;

        Ok(())
    }
}

// =============================================================================
// Local synthesis
// =============================================================================

/// Topic card rendered by FFmpeg: solid background with the topic drawn
/// centered, already at the exact target frame size.
pub struct TopicCardImageSource {
    frame: TargetFrame,
}

impl TopicCardImageSource {
    pub fn new(frame: TargetFrame) -> Self {
        Self { frame }
    }
}

#[async_trait]
impl ImageSource for TopicCardImageSource {
    fn name(&self) -> &'static str {
        "topic-card"
    }

    async fn fetch(&self, topic: &str, output_path: &Path) -> ProviderResult<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let graph = format!(
            "color=c={}:s={}",
            CARD_COLOR,
            self.frame.size_arg()
        );
        let drawtext = format!(
            "drawtext=text='{}':fontcolor=white:fontsize=72:\
             x=(w-text_w)/2:y=(h-text_h)/2",
            escape_drawtext(topic)
        );

        let cmd = FfmpegCommand::new(output_path)
            .lavfi(graph)
            .video_filter(drawtext)
            .frames(1);

        FfmpegRunner::new().with_timeout(30).run(&cmd).await?;

        if !output_path.exists() {
            return Err(ProviderError::ArtifactMissing(output_path.to_path_buf()));
        }

        Ok(())
    }
}

/// Last-resort tier: a plain solid canvas written with the `image`
/// crate, no external tools involved.
pub struct SolidCanvasImageSource {
    frame: TargetFrame,
}

impl SolidCanvasImageSource {
    pub fn new(frame: TargetFrame) -> Self {
        Self { frame }
    }
}

#[async_trait]
impl ImageSource for SolidCanvasImageSource {
    fn name(&self) -> &'static str {
        "solid-canvas"
    }

    async fn fetch(&self, _topic: &str, output_path: &Path) -> ProviderResult<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let canvas = image::RgbImage::from_pixel(
            self.frame.width,
            self.frame.height,
            image::Rgb([0x10, 0x24, 0x3e]),
        );

        // image::save is sync; the canvas is small enough that blocking
        // the worker thread here is acceptable for a last-resort path.
        let path = output_path.to_path_buf();
        tokio::task::spawn_blocking(move || canvas.save(&path))
            .await
            .map_err(|e| ProviderError::config(format!("Canvas render task failed: {e}")))?
            .map_err(|e| ProviderError::config(format!("Canvas save failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_pexels_downloads_first_portrait_photo() {
        let server = MockServer::start().await;
        let image_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01];

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("Authorization", "test-key"))
            .and(query_param("orientation", "portrait"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "photos": [{"src": {"large": format!("{}/photos/1.jpg", server.uri())}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/photos/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("background.jpg");

        let source = PexelsImageSource::new("test-key").with_base_url(server.uri());
        source.fetch("bridges", &out).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), image_bytes);
    }

    #[tokio::test]
    async fn test_pexels_empty_results_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "photos": []
            })))
            .mount(&server)
            .await;

        let source = PexelsImageSource::new("test-key").with_base_url(server.uri());
        let dir = TempDir::new().unwrap();
        let err = source
            .fetch("nothing", &dir.path().join("bg.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_solid_canvas_matches_target_frame() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("background.png");

        let source = SolidCanvasImageSource::new(TargetFrame::shorts());
        source.fetch("anything", &out).await.unwrap();

        let (w, h) = image::image_dimensions(&out).unwrap();
        assert_eq!((w, h), (1080, 1920));
    }

    #[tokio::test]
    async fn test_provider_falls_through_to_canvas() {
        struct AlwaysFails;

        #[async_trait]
        impl ImageSource for AlwaysFails {
            fn name(&self) -> &'static str {
                "always-fails"
            }
            async fn fetch(&self, _topic: &str, _output_path: &Path) -> ProviderResult<()> {
                Err(ProviderError::EmptyResult("no network".to_string()))
            }
        }

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("background.png");

        let provider = ImageProvider::new(vec![
            Box::new(AlwaysFails),
            Box::new(SolidCanvasImageSource::new(TargetFrame::shorts())),
        ]);
        provider.fetch("bridges", &out).await.unwrap();
        assert!(out.exists());
    }
}
