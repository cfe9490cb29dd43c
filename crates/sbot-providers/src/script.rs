//! Script generation via Gemini, with a deterministic topic fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use sbot_models::narration::{fallback_script, MIN_SCRIPT_CHARS};

use crate::error::{ProviderError, ProviderResult};

/// Default per-request timeout for script generation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini REST endpoint base.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one answers.
const GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.5-pro",
];

/// A single way of producing a narration script.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Human-readable strategy name for logging.
    fn name(&self) -> &'static str;

    /// Produce a narration script for the topic.
    async fn generate(&self, topic: &str) -> ProviderResult<String>;
}

/// Ordered strategy list for script generation.
///
/// Strategies are tried in sequence; the last one (the deterministic
/// fallback) never fails, so `generate` only errors when the list is
/// misconfigured to be empty.
pub struct ScriptProvider {
    sources: Vec<Box<dyn ScriptSource>>,
}

impl ScriptProvider {
    /// Build the standard chain: Gemini, then the topic fallback.
    pub fn from_env() -> Self {
        let mut sources: Vec<Box<dyn ScriptSource>> = Vec::new();
        match GeminiScriptSource::from_env() {
            Ok(gemini) => sources.push(Box::new(gemini)),
            Err(e) => warn!("Script generator unavailable ({}), fallback only", e),
        }
        sources.push(Box::new(FallbackScriptSource));
        Self { sources }
    }

    /// Build from an explicit strategy list (tests, custom chains).
    pub fn new(sources: Vec<Box<dyn ScriptSource>>) -> Self {
        Self { sources }
    }

    /// Generate a script, falling through the strategy list.
    pub async fn generate(&self, topic: &str) -> ProviderResult<String> {
        let mut last_error = None;

        for source in &self.sources {
            match source.generate(topic).await {
                Ok(script) => {
                    info!("Script produced by {} ({} chars)", source.name(), script.len());
                    return Ok(script);
                }
                Err(e) => {
                    warn!("Script source {} failed: {}", source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::config("No script sources configured")))
    }
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini-backed script generation.
pub struct GeminiScriptSource {
    api_key: String,
    client: Client,
    base_url: String,
}

impl GeminiScriptSource {
    /// Create from `GEMINI_API_KEY`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::config("GEMINI_API_KEY not set"))?;
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
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the shorts-script prompt.
    fn build_prompt(&self, topic: &str) -> String {
        format!(
            r#"Create a 45-50 second YouTube Shorts script about: {topic}

Requirements:
- Hook the viewer in the first 3 seconds
- Make it educational and engaging
- Use simple language
- Include a surprising fact or statistic
- End with a call-to-action (like/subscribe)
- Keep it under 150 words
- Write in a conversational tone

Format: Just return the script text, no extra formatting.
"#
        )
    }

    /// Call one Gemini model.
    async fn call_model(&self, model: &str, prompt: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(status, body));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ProviderError::EmptyResult("No content in Gemini response".to_string()))?;

        Ok(strip_markdown_fences(text).to_string())
    }
}

#[async_trait]
impl ScriptSource for GeminiScriptSource {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, topic: &str) -> ProviderResult<String> {
        let prompt = self.build_prompt(topic);
        let mut last_error = None;

        for model in GEMINI_MODELS {
            info!("Attempting script generation with model: {}", model);
            match self.call_model(model, &prompt).await {
                Ok(script) => {
                    let script = script.trim().to_string();
                    if script.len() < MIN_SCRIPT_CHARS {
                        return Err(ProviderError::ScriptTooShort {
                            chars: script.len(),
                        });
                    }
                    return Ok(script);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::EmptyResult("All Gemini models failed".to_string())))
    }
}

/// Deterministic topic-based fallback; never fails.
pub struct FallbackScriptSource;

#[async_trait]
impl ScriptSource for FallbackScriptSource {
    fn name(&self) -> &'static str {
        "topic-fallback"
    }

    async fn generate(&self, topic: &str) -> ProviderResult<String> {
        Ok(fallback_script(topic))
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gemini_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }

    #[test]
    fn test_strip_markdown_fences() {
        assert_eq!(strip_markdown_fences("```json\nhello\n```"), "hello");
        assert_eq!(strip_markdown_fences("```\nhello\n```"), "hello");
        assert_eq!(strip_markdown_fences("hello"), "hello");
    }

    #[tokio::test]
    async fn test_gemini_generates_script() {
        let server = MockServer::start().await;
        let script = "Here is a fascinating fact about bridges that most people never \
                      notice when they drive across one every single day.";

        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(script)))
            .mount(&server)
            .await;

        let source = GeminiScriptSource::new("test-key").with_base_url(server.uri());
        let result = source.generate("bridges").await.unwrap();
        assert_eq!(result, script);
    }

    #[tokio::test]
    async fn test_gemini_rejects_short_script() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("Too short.")))
            .mount(&server)
            .await;

        let source = GeminiScriptSource::new("test-key").with_base_url(server.uri());
        let err = source.generate("bridges").await.unwrap_err();
        assert!(matches!(err, ProviderError::ScriptTooShort { .. }));
    }

    #[tokio::test]
    async fn test_provider_falls_back_to_topic_script() {
        struct AlwaysFails;

        #[async_trait]
        impl ScriptSource for AlwaysFails {
            fn name(&self) -> &'static str {
                "always-fails"
            }
            async fn generate(&self, _topic: &str) -> ProviderResult<String> {
                Err(ProviderError::EmptyResult("down".to_string()))
            }
        }

        let provider = ScriptProvider::new(vec![
            Box::new(AlwaysFails),
            Box::new(FallbackScriptSource),
        ]);

        let script = provider.generate("Suspension Bridges").await.unwrap();
        assert!(script.contains("suspension bridges"));
    }
}
