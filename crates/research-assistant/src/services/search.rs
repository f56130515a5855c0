//! Topic search with PDF extraction and store ingestion.

use std::sync::Arc;

use futures::StreamExt;

use crate::client::ArxivClient;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Paper, PaperSummary, SearchResponse};
use crate::pdf::PdfExtractor;
use crate::store::PaperStore;

/// Searches arXiv and ingests every hit into the paper store.
pub struct SearchOrchestrator {
    arxiv: ArxivClient,
    extractor: PdfExtractor,
    store: Arc<dyn PaperStore>,
    concurrency: usize,
}

impl SearchOrchestrator {
    /// Create an orchestrator processing up to `concurrency` papers at once.
    #[must_use]
    pub fn new(
        arxiv: ArxivClient,
        extractor: PdfExtractor,
        store: Arc<dyn PaperStore>,
        concurrency: usize,
    ) -> Self {
        Self { arxiv, extractor, store, concurrency: concurrency.max(1) }
    }

    /// Search `topic`, extract and store each paper, and summarize them in arXiv order.
    ///
    /// A paper whose PDF cannot be extracted is stored without text; a paper
    /// the store rejects is still reported.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a blank topic and
    /// [`ServiceError::Client`] when arXiv fails.
    pub async fn search(&self, topic: &str, max_results: usize) -> ServiceResult<SearchResponse> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ServiceError::validation("topic", "Topic cannot be empty"));
        }
        if max_results == 0 {
            return Err(ServiceError::validation("max_results", "max_results must be at least 1"));
        }

        let entries = self.arxiv.search(topic, max_results).await?;

        let summaries: Vec<PaperSummary> = futures::stream::iter(entries)
            .map(|entry| self.ingest(entry.into_paper()))
            .buffered(self.concurrency)
            .collect()
            .await;

        let with_text = summaries.iter().filter(|s| s.has_full_text).count();
        tracing::info!(
            topic = %topic,
            count = summaries.len(),
            with_text,
            "Search ingestion complete"
        );

        Ok(SearchResponse::from_papers(summaries))
    }

    async fn ingest(&self, mut paper: Paper) -> PaperSummary {
        if let Some(extraction) = self.extractor.extract(&paper.url).await {
            paper.full_text = Some(extraction.text);
            paper.images = Some(extraction.images);
        }

        if let Err(e) = self.store.upsert(&paper).await {
            tracing::error!(paper_id = %paper.id, error = %e, "Failed to store paper");
        }

        paper.summary()
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("arxiv", &self.arxiv)
            .field("store", &self.store.backend_name())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
