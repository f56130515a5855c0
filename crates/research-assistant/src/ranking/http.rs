//! OpenAI-compatible embeddings endpoint (`POST {base}/v1/embeddings`).
//!
//! Works against OpenAI itself, Ollama, vLLM and text-embeddings-inference.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;

use super::Embedder;
use crate::client::check_status;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by a remote embeddings API.
pub struct HttpEmbedder {
    client: ClientWithMiddleware,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    /// Dimension of the last response.
    dimension: AtomicUsize,
}

impl HttpEmbedder {
    /// Create an embedder for `{base_url}/v1/embeddings`.
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            dimension: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> ClientResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({ "model": self.model, "input": texts });
        let body_str = serde_json::to_string(&body)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(body_str);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(request.send().await?).await?;
        let mut parsed: EmbeddingResponse = response.json().await?;

        if parsed.data.len() != texts.len() {
            return Err(ClientError::malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        if let Some(first) = parsed.data.first() {
            // First response fixes the dimension for the embedder's lifetime.
            let _ = self.dimension.compare_exchange(
                0,
                first.embedding.len(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }

        tracing::debug!(model = %self.model, count = texts.len(), "Fetched embeddings");
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension.load(Ordering::Relaxed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
