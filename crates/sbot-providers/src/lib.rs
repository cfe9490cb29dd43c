//! External collaborators for the shorts pipeline.
//!
//! Each capability is an ordered list of strategies tried in sequence:
//! - Script: Gemini generation, then a deterministic topic fallback
//! - Voice: Google Translate TTS (no fallback; a missing narration is fatal)
//! - Image: Pexels search, then a locally synthesized topic card, then a
//!   plain solid canvas
//! - Publish: YouTube resumable upload with locally stored OAuth tokens

pub mod error;
pub mod image_source;
pub mod publish;
pub mod script;
pub mod voice;

pub use error::{ProviderError, ProviderResult};
pub use image_source::{
    ImageProvider, ImageSource, PexelsImageSource, SolidCanvasImageSource, TopicCardImageSource,
};
pub use publish::{PublishReceipt, PublishSettings, Publisher, YouTubePublisher};
pub use script::{FallbackScriptSource, GeminiScriptSource, ScriptProvider, ScriptSource};
pub use voice::{TranslateTtsVoice, VoiceProvider};
