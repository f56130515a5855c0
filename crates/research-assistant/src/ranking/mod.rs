//! Semantic ranking of text chunks against a query.
//!
//! An [`Embedder`] turns text into vectors; the [`TextRanker`] normalizes them,
//! caches them, and scores chunks by dot product with the query vector.

mod hashing;
mod http;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use moka::future::Cache;
use regex::Regex;
use reqwest_middleware::ClientWithMiddleware;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// Default number of chunks kept by [`TextRanker::extract_relevant`].
pub const DEFAULT_MAX_CHUNKS: usize = 3;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("blank line pattern is valid"));

/// Trait for text embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed several texts; the output has one vector per input, in order.
    async fn embed_batch(&self, texts: &[&str]) -> ClientResult<Vec<Vec<f32>>>;

    /// Vector dimension, or 0 when not yet known.
    fn dimension(&self) -> usize;

    /// Model identifier, also used to namespace cached vectors.
    fn model_name(&self) -> &str;
}

/// Pick the embedder for the configuration: the HTTP embedder when an
/// embeddings URL is set, otherwise the local hashing embedder.
#[must_use]
pub fn embedder_from_config(client: ClientWithMiddleware, config: &Config) -> Arc<dyn Embedder> {
    match &config.embedding_url {
        Some(url) => Arc::new(HttpEmbedder::new(
            client,
            url,
            &config.embedding_model,
            config.embedding_api_key.clone(),
        )),
        None => Arc::new(HashingEmbedder::default()),
    }
}

/// A chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Position of the chunk in the input.
    pub index: usize,
    /// Chunk text.
    pub text: String,
    /// Dot product of the normalized chunk and query vectors.
    pub score: f32,
}

/// Split text into paragraphs on blank lines, dropping empty pieces.
#[must_use]
pub fn split_chunks(text: &str) -> Vec<String> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Scores text chunks against a query.
#[derive(Clone)]
pub struct TextRanker {
    embedder: Arc<dyn Embedder>,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl TextRanker {
    /// Create a ranker over the given embedder.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, config: &Config) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();
        Self { embedder, cache }
    }

    /// Chunks with scores, highest first. Equal scores keep input order.
    ///
    /// # Errors
    ///
    /// Returns error if the embedder fails.
    pub async fn rank(&self, chunks: &[String], query: &str) -> ClientResult<Vec<ScoredChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts: Vec<&str> = Vec::with_capacity(chunks.len() + 1);
        texts.push(query);
        texts.extend(chunks.iter().map(String::as_str));

        let vectors = self.embed(&texts).await?;
        let (query_vec, chunk_vecs) = vectors
            .split_first()
            .ok_or_else(|| ClientError::malformed("embedder returned no vectors"))?;

        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .zip(chunk_vecs)
            .enumerate()
            .map(|(index, (text, vec))| ScoredChunk {
                index,
                text: text.clone(),
                score: dot(query_vec, vec),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }

    /// The `max_chunks` paragraphs of `text` most relevant to `query`, best
    /// first, joined with a space.
    ///
    /// # Errors
    ///
    /// Returns error if the embedder fails.
    pub async fn extract_relevant(
        &self,
        text: &str,
        query: &str,
        max_chunks: usize,
    ) -> ClientResult<String> {
        let chunks = split_chunks(text);
        let ranked = self.rank(&chunks, query).await?;
        Ok(ranked
            .into_iter()
            .take(max_chunks)
            .map(|chunk| chunk.text)
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Best similarity between `query` and any of `texts`; 0 when `texts` is empty.
    ///
    /// # Errors
    ///
    /// Returns error if the embedder fails.
    pub async fn score_best(&self, query: &str, texts: &[String]) -> ClientResult<f32> {
        let ranked = self.rank(texts, query).await?;
        Ok(ranked.first().map_or(0.0, |chunk| chunk.score))
    }

    /// Normalized vectors for `texts`, served from the cache where possible.
    async fn embed(&self, texts: &[&str]) -> ClientResult<Vec<Arc<Vec<f32>>>> {
        let keys: Vec<String> = texts.iter().map(|t| self.cache_key(t)).collect();

        let mut vectors: Vec<Option<Arc<Vec<f32>>>> = Vec::with_capacity(texts.len());
        for key in &keys {
            vectors.push(self.cache.get(key).await);
        }

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| vectors[i].is_none()).collect();
        if !missing.is_empty() {
            let batch: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let fresh = self.embedder.embed_batch(&batch).await?;
            if fresh.len() != batch.len() {
                return Err(ClientError::malformed(format!(
                    "embedder returned {} vectors for {} inputs",
                    fresh.len(),
                    batch.len()
                )));
            }
            let expected = self.embedder.dimension();
            if let Some(bad) =
                fresh.iter().find(|v| v.is_empty() || (expected > 0 && v.len() != expected))
            {
                return Err(ClientError::malformed(format!(
                    "embedder returned a {}-dimensional vector, expected {expected}",
                    bad.len()
                )));
            }

            for (&i, vector) in missing.iter().zip(fresh) {
                let vector = Arc::new(normalize(vector));
                self.cache.insert(keys[i].clone(), Arc::clone(&vector)).await;
                vectors[i] = Some(vector);
            }
            tracing::trace!(
                embedded = missing.len(),
                cached = texts.len() - missing.len(),
                "Embedded texts"
            );
        }

        Ok(vectors.into_iter().flatten().collect())
    }

    fn cache_key(&self, text: &str) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(self.embedder.model_name().as_bytes());
        hasher.update(b"|");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for TextRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRanker")
            .field("model", &self.embedder.model_name())
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

/// Scale to unit length; the zero vector is returned unchanged.
pub(crate) fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
