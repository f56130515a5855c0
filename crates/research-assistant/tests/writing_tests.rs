//! Improvement plan, review and future work generation tests.

mod common;

use std::sync::Arc;

use research_assistant::error::ServiceError;
use research_assistant::services::{SUMMARY_MARKER, WritingOrchestrator};

use common::{FakeGenerator, paper};

fn orchestrator(generator: FakeGenerator) -> (WritingOrchestrator, Arc<FakeGenerator>) {
    let generator = Arc::new(generator);
    (WritingOrchestrator::new(generator.clone()), generator)
}

#[tokio::test]
async fn test_plan_keeps_text_after_marker() {
    let reply = format!("Echoed prompt text...\n{SUMMARY_MARKER}\n  Combine both methods.  ");
    let (writing, generator) = orchestrator(FakeGenerator::replying(&reply));

    let papers = vec![paper("a", "Sparse Attention", 2020), paper("b", "Linear Attention", 2021)];
    let plan = writing.improvement_plan(&papers).await.unwrap();

    assert_eq!(plan.improvement_plan, "Combine both methods.");
    assert_eq!(plan.findings.len(), 2);
    assert!(plan.metrics.contains_key("accuracy_improvement"));

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Title: Sparse Attention\nYear: 2020\nAbstract: Sparse Attention abstract."));
    assert!(prompt.contains("Title: Linear Attention"));
    assert!(prompt.trim_end().ends_with(SUMMARY_MARKER));
}

#[tokio::test]
async fn test_plan_without_marker_is_whole_reply() {
    let (writing, _) = orchestrator(FakeGenerator::replying("  Just a plan.\n"));
    let plan = writing.improvement_plan(&[paper("a", "A", 2020)]).await.unwrap();
    assert_eq!(plan.improvement_plan, "Just a plan.");
}

#[tokio::test]
async fn test_review_matches_plan_generation() {
    let (writing, generator) = orchestrator(FakeGenerator::replying("A solid review."));
    let papers = vec![paper("a", "A", 2020)];

    let review = writing.review(&papers).await.unwrap();
    let plan = writing.improvement_plan(&papers).await.unwrap();

    assert_eq!(review.review, plan.improvement_plan);
    assert_eq!(review.findings, plan.findings);
    let prompts = generator.prompts();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_future_work_reports_paper_ids() {
    let reply = format!("{SUMMARY_MARKER} Scale to larger graphs.");
    let (writing, generator) = orchestrator(FakeGenerator::replying(&reply));

    let papers = vec![paper("x1", "Graphs", 2022), paper("x2", "More Graphs", 2023)];
    let future = writing.future_work(&papers).await.unwrap();

    assert_eq!(future.future_work, "Scale to larger graphs.");
    assert_eq!(future.paper_ids, vec!["x1", "x2"]);
    assert!(generator.prompts()[0].contains("future research directions"));
}

#[tokio::test]
async fn test_generation_failures_use_fallback_text() {
    let (writing, _) = orchestrator(FakeGenerator::failing());
    let papers = vec![paper("a", "A", 2020)];

    let plan = writing.improvement_plan(&papers).await.unwrap();
    assert_eq!(plan.improvement_plan, "Failed to generate improvement plan.");

    let future = writing.future_work(&papers).await.unwrap();
    assert_eq!(future.future_work, "Failed to generate future work.");
    assert_eq!(future.paper_ids, vec!["a"]);
}

#[tokio::test]
async fn test_empty_selection_is_rejected_without_generation() {
    let (writing, generator) = orchestrator(FakeGenerator::replying("unused"));

    assert!(matches!(
        writing.improvement_plan(&[]).await,
        Err(ServiceError::Validation { .. })
    ));
    assert!(matches!(writing.review(&[]).await, Err(ServiceError::Validation { .. })));
    assert!(matches!(writing.future_work(&[]).await, Err(ServiceError::Validation { .. })));
    assert_eq!(generator.calls(), 0);
}
