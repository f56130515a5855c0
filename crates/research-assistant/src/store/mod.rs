//! Paper store: a property graph of papers, authors, keywords and images.
//!
//! Node labels are `Paper`, `Author`, `Keyword` and `Image`; relationships are
//! `(Author)-[:AUTHORED]->(Paper)`, `(Paper)-[:HAS_KEYWORD]->(Keyword)` and
//! `(Paper)-[:HAS_IMAGE]->(Image)`. Nodes are only ever created or updated.
//!
//! Every operation returns a [`StoreResult`], so callers can tell "nothing
//! matched" (`Ok` with an empty value) apart from "the backend failed" (`Err`).

mod memory;
mod neo4j;

use std::sync::Arc;

use async_trait::async_trait;

pub use memory::MemoryGraphStore;
pub use neo4j::Neo4jStore;

use crate::config::{Config, StoreBackend};
use crate::error::StoreResult;
use crate::models::{Paper, RelatedPaper};

/// Trait for paper store backends.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Create or update a paper and all of its author, keyword and image
    /// relationships in one atomic transaction.
    ///
    /// Storing the same `id` again overwrites the paper's fields and never
    /// duplicates the node.
    async fn upsert(&self, paper: &Paper) -> StoreResult<()>;

    /// Get a paper with its authors, keywords and images.
    async fn get(&self, id: &str) -> StoreResult<Option<Paper>>;

    /// Papers whose title or abstract contains `keyword` (case-sensitive) and
    /// whose year is at least `min_year`, newest first, at most `limit`.
    ///
    /// Papers of the same year are ordered by id.
    async fn search(&self, keyword: &str, min_year: i32, limit: usize) -> StoreResult<Vec<Paper>>;

    /// Up to `limit` other papers ranked by the number of shared keywords,
    /// most first; ties are ordered by id.
    async fn related(&self, id: &str, limit: usize) -> StoreResult<Vec<RelatedPaper>>;

    /// Create indexes and uniqueness constraints. Idempotent.
    async fn ensure_schema(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Check the backend is reachable.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Build the store backend selected in the configuration.
///
/// # Errors
///
/// Returns error if the Neo4j HTTP client cannot be initialized.
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn PaperStore>> {
    let store: Arc<dyn PaperStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryGraphStore::new()),
        StoreBackend::Neo4j => Arc::new(Neo4jStore::new(config)?),
    };
    tracing::info!(backend = store.backend_name(), "Paper store ready");
    Ok(store)
}
