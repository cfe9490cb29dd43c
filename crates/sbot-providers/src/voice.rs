//! Speech synthesis via the Google Translate TTS endpoint.
//!
//! The endpoint caps utterance length, so the script is split into
//! chunks on sentence/whitespace boundaries and the returned MP3
//! segments are concatenated. There is no fallback voice: a missing
//! narration artifact is fatal to the run.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Default per-request timeout for synthesis calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Translate TTS endpoint base.
const TRANSLATE_TTS_BASE_URL: &str = "https://translate.google.com";

/// Maximum characters per synthesis request.
const MAX_CHUNK_CHARS: usize = 200;

/// Synthesizes narration audio to a file.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Synthesize `text` and write the audio to `output_path`.
    async fn synthesize(&self, text: &str, output_path: &Path) -> ProviderResult<()>;
}

/// Google Translate TTS client.
pub struct TranslateTtsVoice {
    client: Client,
    language: String,
    base_url: String,
}

impl TranslateTtsVoice {
    /// Create a synthesizer for the given language code (e.g. "en").
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            language: language.into(),
            base_url: TRANSLATE_TTS_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch one MP3 segment.
    async fn fetch_chunk(&self, chunk: &str) -> ProviderResult<Vec<u8>> {
        let url = format!("{}/translate_tts", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", chunk),
                ("textlen", &chunk.len().to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl VoiceProvider for TranslateTtsVoice {
    async fn synthesize(&self, text: &str, output_path: &Path) -> ProviderResult<()> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ProviderError::EmptyResult(
                "Empty script passed to voice synthesis".to_string(),
            ));
        }

        info!(
            "Synthesizing {} chars of narration in {} chunk(s)",
            text.len(),
            chunks.len()
        );

        // MP3 frames are self-delimiting; segments concatenate directly.
        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Fetching TTS chunk {}/{}", i + 1, chunks.len());
            audio.extend(self.fetch_chunk(chunk).await?);
        }

        if audio.is_empty() {
            return Err(ProviderError::EmptyResult(
                "TTS endpoint returned no audio".to_string(),
            ));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(output_path, &audio).await?;

        if !output_path.exists() {
            return Err(ProviderError::ArtifactMissing(output_path.to_path_buf()));
        }

        Ok(())
    }
}

/// Split text into chunks of at most `max_chars`, preferring sentence
/// boundaries, then whitespace. Words longer than `max_chars` are split
/// hard rather than dropped.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if word.len() > max_chars {
            // Pathological token; flush and split it hard
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut rest = word;
            while rest.len() > max_chars {
                let split = floor_char_boundary(rest, max_chars);
                chunks.push(rest[..split].to_string());
                rest = &rest[split..];
            }
            current = rest.to_string();
            continue;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);

            // Prefer to break after sentence-ending punctuation once the
            // chunk is reasonably full.
            if current.len() > max_chars / 2 && word.ends_with(['.', '!', '?']) {
                chunks.push(std::mem::take(&mut current));
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Largest byte index <= `max` that lands on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut i = max.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
