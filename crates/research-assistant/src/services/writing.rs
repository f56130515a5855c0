//! Long-form writing over selected papers: improvement plans, reviews and
//! future research directions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::generation::{GenerationOptions, GenerationRequest, TextGenerator};
use crate::models::{FutureWork, ImprovementPlan, Paper, Review};

/// Marker that ends every writing prompt; output before it is discarded.
pub const SUMMARY_MARKER: &str = "Summary of the work presented:";

const PLAN_FAILED: &str = "Failed to generate improvement plan.";
const FUTURE_WORK_FAILED: &str = "Failed to generate future work.";

/// Text after [`SUMMARY_MARKER`] when present, otherwise the whole text; trimmed.
#[must_use]
pub fn trim_to_marker(text: &str) -> &str {
    text.find(SUMMARY_MARKER)
        .map_or(text, |start| &text[start + SUMMARY_MARKER.len()..])
        .trim()
}

fn papers_block(papers: &[Paper]) -> String {
    papers
        .iter()
        .map(|p| format!("Title: {}\nYear: {}\nAbstract: {}", p.title, p.year, p.r#abstract))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn improvement_prompt(papers: &[Paper]) -> String {
    format!(
        "Using the key findings from the following papers:\n\n{}\n\n\
         Generate an improvement plan that includes novel contributions and suggestions \
         for new research directions. Structure it as a cohesive plan.\n\n{SUMMARY_MARKER}\n",
        papers_block(papers)
    )
}

fn future_work_prompt(papers: &[Paper]) -> String {
    format!(
        "Based on the following papers:\n\n{}\n\n\
         Identify open problems and limitations they leave unresolved, and propose concrete \
         future research directions that build on them.\n\n{SUMMARY_MARKER}\n",
        papers_block(papers)
    )
}

// Findings and metrics are not yet derived from the generated text.
fn placeholder_findings() -> Vec<String> {
    vec![
        "Finding 1: Enhanced methodology improves accuracy by 15%.".to_string(),
        "Finding 2: Incorporating X technique reduces computational overhead.".to_string(),
    ]
}

fn placeholder_metrics() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("accuracy_improvement".to_string(), 0.15),
        ("computational_efficiency_gain".to_string(), 0.20),
    ])
}

/// Generates improvement plans, reviews and future work.
pub struct WritingOrchestrator {
    generator: Arc<dyn TextGenerator>,
}

impl WritingOrchestrator {
    /// Create an orchestrator over a generation engine.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Improvement plan grounded in the papers' titles, years and abstracts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when `papers` is empty. Generation
    /// failures yield a fallback plan instead of an error.
    pub async fn improvement_plan(&self, papers: &[Paper]) -> ServiceResult<ImprovementPlan> {
        require_papers(papers)?;
        let plan = self.write(improvement_prompt(papers), PLAN_FAILED).await;

        tracing::info!(papers = papers.len(), chars = plan.len(), "Improvement plan generated");
        Ok(ImprovementPlan {
            improvement_plan: plan,
            findings: placeholder_findings(),
            metrics: placeholder_metrics(),
        })
    }

    /// Review of the papers; same generation as [`Self::improvement_plan`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when `papers` is empty.
    pub async fn review(&self, papers: &[Paper]) -> ServiceResult<Review> {
        self.improvement_plan(papers).await.map(Review::from)
    }

    /// Future research directions.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when `papers` is empty.
    pub async fn future_work(&self, papers: &[Paper]) -> ServiceResult<FutureWork> {
        require_papers(papers)?;
        let future_work = self.write(future_work_prompt(papers), FUTURE_WORK_FAILED).await;

        tracing::info!(papers = papers.len(), chars = future_work.len(), "Future work generated");
        Ok(FutureWork { future_work, paper_ids: papers.iter().map(|p| p.id.clone()).collect() })
    }

    async fn write(&self, prompt: String, fallback: &str) -> String {
        let request = GenerationRequest::new(prompt, GenerationOptions::WRITING);
        match self.generator.generate(&request).await {
            Ok(text) => trim_to_marker(&text).to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Writing generation failed");
                fallback.to_string()
            }
        }
    }
}

fn require_papers(papers: &[Paper]) -> ServiceResult<()> {
    if papers.is_empty() {
        return Err(ServiceError::validation("paper", "At least one paper is required"));
    }
    Ok(())
}

impl std::fmt::Debug for WritingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritingOrchestrator").field("model", &self.generator.model_name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_to_marker_drops_prompt_echo() {
        let text = format!("Title: X\n{SUMMARY_MARKER}\n  The plan.  ");
        assert_eq!(trim_to_marker(&text), "The plan.");
    }

    #[test]
    fn test_trim_without_marker_keeps_text() {
        assert_eq!(trim_to_marker("  just text \n"), "just text");
    }

    #[test]
    fn test_prompt_lists_every_paper_and_ends_with_marker() {
        let papers = vec![
            Paper { title: "A".into(), year: 2020, r#abstract: "aa".into(), ..Paper::default() },
            Paper { title: "B".into(), year: 2021, r#abstract: "bb".into(), ..Paper::default() },
        ];
        let prompt = improvement_prompt(&papers);
        assert!(prompt.contains("Title: A\nYear: 2020\nAbstract: aa"));
        assert!(prompt.contains("Title: B\nYear: 2021\nAbstract: bb"));
        assert!(prompt.trim_end().ends_with(SUMMARY_MARKER));
    }

    #[test]
    fn test_placeholder_metrics() {
        let metrics = placeholder_metrics();
        assert_eq!(metrics["accuracy_improvement"], 0.15);
        assert_eq!(metrics["computational_efficiency_gain"], 0.20);
        assert_eq!(placeholder_findings().len(), 2);
    }
}
