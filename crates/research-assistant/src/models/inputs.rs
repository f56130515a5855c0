//! Request bodies accepted by the HTTP API.

use serde::{Deserialize, Serialize};

use super::Paper;

/// `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text topic sent to arXiv.
    pub topic: String,

    /// Maximum papers to fetch and ingest.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    10
}

/// `POST /answer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Papers to answer from.
    #[serde(default)]
    pub paper: Vec<Paper>,

    /// Natural-language question.
    #[serde(default)]
    pub question: String,
}

/// `POST /review`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Papers to review.
    #[serde(default)]
    pub paper: Vec<Paper>,
}

/// `POST /future_work` and `POST /improvement_plan`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperIdsRequest {
    /// Ids of previously stored papers.
    #[serde(default)]
    pub paper_ids: Vec<String>,
}

/// Query string for `GET /papers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSearchQuery {
    /// Case-sensitive substring matched against title and abstract.
    #[serde(default)]
    pub q: String,

    /// Minimum publication year (inclusive).
    #[serde(default)]
    pub min_year: i32,

    /// Maximum papers to return.
    #[serde(default = "default_store_limit")]
    pub limit: usize,
}

/// Query string for `GET /papers/{id}/related`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedQuery {
    /// Maximum related papers to return.
    #[serde(default = "default_related_limit")]
    pub limit: usize,
}

fn default_store_limit() -> usize {
    100
}

fn default_related_limit() -> usize {
    5
}
