//! arXiv query API client.
//!
//! Provides:
//! - Topic search sorted by submission date (newest first)
//! - Rate limiting (arXiv asks for one request every three seconds)
//! - Response caching keyed by query parameters

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use super::{atom, build_http_client, cache_key, check_status};
use crate::config::{Config, api};
use crate::error::ClientResult;
use crate::models::Paper;

/// One entry of an arXiv search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivEntry {
    /// Versioned arXiv id (e.g. `2101.00001v2`).
    pub id: String,
    /// Whitespace-normalized title.
    pub title: String,
    /// Whitespace-normalized abstract.
    pub summary: String,
    /// Author names in feed order.
    pub authors: Vec<String>,
    /// Year of first publication.
    pub year: Option<i32>,
    /// PDF download URL.
    pub pdf_url: String,
    /// Category terms (primary first).
    pub categories: Vec<String>,
}

impl ArxivEntry {
    /// Convert into a [`Paper`] without extracted content; categories become keywords.
    #[must_use]
    pub fn into_paper(self) -> Paper {
        Paper {
            id: self.id,
            title: self.title,
            authors: self.authors,
            r#abstract: self.summary,
            year: self.year.unwrap_or_default(),
            url: self.pdf_url,
            full_text: None,
            images: None,
            keywords: self.categories,
        }
    }
}

/// arXiv API client.
#[derive(Clone)]
pub struct ArxivClient {
    /// HTTP client with retry middleware.
    client: ClientWithMiddleware,

    /// Raw feed cache.
    cache: Cache<String, Arc<String>>,

    /// Query endpoint.
    api_url: String,

    /// Request pacing; `None` when the configured period is zero.
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ArxivClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client that shares an existing HTTP client.
    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, config: &Config) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        let limiter = Quota::with_period(config.arxiv_rate_limit)
            .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))));

        Self { client, cache, api_url: config.arxiv_api_url.clone(), limiter }
    }

    /// Search papers by free-text topic, newest submissions first.
    ///
    /// `max_results` is capped at [`api::ARXIV_MAX_RESULTS`].
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or an unparseable feed.
    pub async fn search(&self, topic: &str, max_results: usize) -> ClientResult<Vec<ArxivEntry>> {
        let max_results = max_results.min(api::ARXIV_MAX_RESULTS);
        let params = vec![
            ("search_query".to_string(), format!("all:{}", topic.trim())),
            ("start".to_string(), "0".to_string()),
            ("max_results".to_string(), max_results.to_string()),
            ("sortBy".to_string(), "submittedDate".to_string()),
            ("sortOrder".to_string(), "descending".to_string()),
        ];

        let body = self.get(&params).await?;
        let mut entries = atom::parse_feed(&body)?;
        entries.truncate(max_results);

        tracing::info!(topic = %topic, count = entries.len(), "arXiv search complete");
        Ok(entries)
    }

    /// Fetch the raw feed, consulting the cache first.
    async fn get(&self, params: &[(String, String)]) -> ClientResult<Arc<String>> {
        let key = cache_key(&self.api_url, params);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("arXiv cache hit");
            return Ok(cached);
        }

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let response = self.client.get(&self.api_url).query(params).send().await?;
        let response = check_status(response).await?;
        let body = Arc::new(response.text().await?);

        self.cache.insert(key, Arc::clone(&body)).await;
        Ok(body)
    }
}

impl std::fmt::Debug for ArxivClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArxivClient")
            .field("api_url", &self.api_url)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_into_paper_maps_categories_to_keywords() {
        let entry = ArxivEntry {
            id: "2101.00001v1".to_string(),
            title: "T".to_string(),
            summary: "S".to_string(),
            authors: vec!["A".to_string()],
            year: None,
            pdf_url: "http://arxiv.org/pdf/2101.00001v1".to_string(),
            categories: vec!["cs.LG".to_string()],
        };
        let paper = entry.into_paper();
        assert_eq!(paper.year, 0);
        assert_eq!(paper.r#abstract, "S");
        assert_eq!(paper.keywords, vec!["cs.LG".to_string()]);
        assert!(!paper.has_full_text());
    }

    #[test]
    fn test_zero_period_disables_limiter() {
        let client = ArxivClient::new(&Config::for_testing("http://127.0.0.1:1")).unwrap();
        assert!(format!("{client:?}").contains("rate_limited: false"));
    }
}
