//! Response bodies produced by the orchestrators and returned by the HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Paper, PaperSummary, RelatedPaper};

/// `/search` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Always `"success"` when the search itself succeeded.
    pub status: String,
    /// Ingested papers in arXiv order.
    pub papers: Vec<PaperSummary>,
    /// Number of papers.
    pub count: usize,
    /// Set when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchResponse {
    /// Wrap ingested summaries.
    #[must_use]
    pub fn from_papers(papers: Vec<PaperSummary>) -> Self {
        let count = papers.len();
        let message = papers.is_empty().then(|| "No papers found".to_string());
        Self { status: "success".to_string(), papers, count, message }
    }
}

/// A paper that contributed context to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Paper id.
    pub paper_id: String,
    /// Paper title.
    pub title: String,
    /// Publication year.
    pub year: i32,
    /// The slice of text that was used, possibly truncated.
    pub excerpt: String,
}

/// `/answer` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text.
    pub answer: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Contributing papers.
    pub sources: Vec<Source>,
    /// Context passed to the engine, possibly truncated.
    pub context_used: String,
}

/// `/improvement_plan` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementPlan {
    /// Generated plan.
    pub improvement_plan: String,
    /// Extracted findings.
    pub findings: Vec<String>,
    /// Extracted metrics.
    pub metrics: BTreeMap<String, f64>,
}

/// `/review` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Generated review.
    pub review: String,
    /// Extracted findings.
    pub findings: Vec<String>,
    /// Extracted metrics.
    pub metrics: BTreeMap<String, f64>,
}

impl From<ImprovementPlan> for Review {
    fn from(plan: ImprovementPlan) -> Self {
        Self { review: plan.improvement_plan, findings: plan.findings, metrics: plan.metrics }
    }
}

/// `/future_work` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureWork {
    /// Generated research directions.
    pub future_work: String,
    /// Ids of the papers the directions were derived from.
    pub paper_ids: Vec<String>,
}

/// `GET /papers` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperList {
    /// Matching papers.
    pub papers: Vec<Paper>,
    /// Number of papers.
    pub count: usize,
}

/// `GET /papers/{id}/related` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedList {
    /// Related papers, most shared keywords first.
    pub papers: Vec<RelatedPaper>,
    /// Number of papers.
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_response_has_message() {
        let res = SearchResponse::from_papers(vec![]);
        assert_eq!(res.count, 0);
        assert_eq!(res.message.as_deref(), Some("No papers found"));

        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn test_review_from_plan() {
        let plan = ImprovementPlan {
            improvement_plan: "plan".to_string(),
            findings: vec!["f".to_string()],
            metrics: BTreeMap::from([("m".to_string(), 0.5)]),
        };
        let review = Review::from(plan);
        assert_eq!(review.review, "plan");
        assert_eq!(review.findings, vec!["f".to_string()]);
    }
}
