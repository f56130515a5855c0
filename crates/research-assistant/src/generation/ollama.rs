//! Ollama-compatible `/api/generate` engine.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use super::{GenerationRequest, TextGenerator};
use crate::client::check_status;
use crate::config::GenerationDevice;
use crate::error::ClientResult;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    images: &'a [String],
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Generation engine speaking the Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: ClientWithMiddleware,
    endpoint: String,
    model: String,
    device: GenerationDevice,
}

impl OllamaGenerator {
    /// Create a generator for `{base_url}/api/generate`.
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        model: &str,
        device: GenerationDevice,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
            device,
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ClientResult<String> {
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.options.temperature,
                top_p: request.options.top_p,
                num_predict: request.options.max_tokens,
                // Zero offloaded layers keeps the whole model on the CPU.
                num_gpu: (self.device == GenerationDevice::Cpu).then_some(0),
            },
            images: &request.images,
        };
        let body_str = serde_json::to_string(&body)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(body_str)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: GenerateResponse = response.json().await?;

        tracing::debug!(
            model = %self.model,
            prompt_chars = request.prompt.len(),
            output_chars = parsed.response.len(),
            "Generation complete"
        );
        Ok(parsed.response.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationOptions;

    #[test]
    fn test_body_shape_for_cpu_device() {
        let images = vec!["aGk=".to_string()];
        let body = GenerateBody {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
                num_predict: GenerationOptions::ANSWER.max_tokens,
                num_gpu: Some(0),
            },
            images: &images,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 150);
        assert_eq!(json["options"]["num_gpu"], 0);
        assert_eq!(json["images"][0], "aGk=");
    }

    #[test]
    fn test_body_omits_empty_images_and_gpu() {
        let body = GenerateBody {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.7, top_p: 0.9, num_predict: 10, num_gpu: None },
            images: &[],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("images").is_none());
        assert!(json["options"].get("num_gpu").is_none());
    }
}
