//! Text generation and figure captioning engines.
//!
//! Both are traits so orchestrators can be driven by the HTTP engine in
//! production and by fakes in tests.

mod captioner;
mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;

pub use captioner::{ImageDescriber, MetadataDescriber, VisionDescriber};
pub use ollama::OllamaGenerator;

use crate::config::Config;
use crate::error::ClientResult;

/// Sampling settings for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

impl GenerationOptions {
    /// Short answers to questions.
    pub const ANSWER: Self = Self { max_tokens: 150, temperature: 0.7, top_p: 0.9 };

    /// Long-form writing (plans, reviews, future work).
    pub const WRITING: Self = Self { max_tokens: 1024, temperature: 0.7, top_p: 0.9 };

    /// Figure descriptions.
    pub const CAPTION: Self = Self { max_tokens: 200, temperature: 0.2, top_p: 0.9 };
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::ANSWER
    }
}

/// A prompt with optional base64 images for multimodal models.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Prompt text.
    pub prompt: String,
    /// Base64-encoded images.
    pub images: Vec<String>,
    /// Sampling settings.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Text-only request.
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self { prompt: prompt.into(), images: Vec::new(), options }
    }

    /// Attach an image.
    #[must_use]
    pub fn with_image(mut self, data: impl Into<String>) -> Self {
        self.images.push(data.into());
        self
    }
}

/// Trait for text generation engines.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the request.
    async fn generate(&self, request: &GenerationRequest) -> ClientResult<String>;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Build the text generator for the configuration.
#[must_use]
pub fn generator_from_config(
    client: ClientWithMiddleware,
    config: &Config,
) -> Arc<dyn TextGenerator> {
    Arc::new(OllamaGenerator::new(
        client,
        &config.generation_url,
        &config.generation_model,
        config.generation_device,
    ))
}

/// Build the figure captioner: a vision model when one is configured, otherwise
/// descriptions from image metadata only.
#[must_use]
pub fn describer_from_config(
    client: ClientWithMiddleware,
    config: &Config,
) -> Arc<dyn ImageDescriber> {
    match &config.vision_model {
        Some(model) => {
            let vision = OllamaGenerator::new(
                client,
                &config.generation_url,
                model,
                config.generation_device,
            );
            Arc::new(VisionDescriber::new(Arc::new(vision)))
        }
        None => Arc::new(MetadataDescriber),
    }
}
