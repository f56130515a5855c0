//! Question answering over a set of papers.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::generation::{GenerationOptions, GenerationRequest, ImageDescriber, TextGenerator};
use crate::models::{Answer, Paper, Source};
use crate::ranking::{DEFAULT_MAX_CHUNKS, TextRanker, split_chunks};

use super::{truncate, truncate_with_ellipsis};

/// Answer returned when the generation engine fails.
pub const GENERATION_FAILED: &str = "Failed to generate answer";

/// Decides whether a question is about a paper's figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureIntent {
    keywords: Vec<String>,
}

impl FigureIntent {
    /// Match questions containing any of `keywords` (case-insensitive).
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Classifier over the configured figure keywords.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.figure_keywords)
    }

    /// Whether the question mentions a figure keyword.
    #[must_use]
    pub fn matches(&self, question: &str) -> bool {
        let question = question.to_lowercase();
        self.keywords.iter().any(|k| question.contains(k.as_str()))
    }
}

/// Limits applied while building and reporting answer context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaOptions {
    /// Paragraphs kept per paper.
    pub max_chunks: usize,
    /// Paper contexts kept when answering over several papers.
    pub max_contexts: usize,
    /// Characters of each source excerpt in the response.
    pub excerpt_chars: usize,
    /// Characters of `context_used` in the response.
    pub context_chars: usize,
}

impl Default for QaOptions {
    fn default() -> Self {
        Self {
            max_chunks: DEFAULT_MAX_CHUNKS,
            max_contexts: 3,
            excerpt_chars: 200,
            context_chars: 1000,
        }
    }
}

/// The slice of one paper used to answer a question.
#[derive(Debug, Clone)]
struct PaperContext {
    paper_id: String,
    title: String,
    year: i32,
    text: String,
}

impl PaperContext {
    fn source(&self, excerpt_chars: usize) -> Source {
        Source {
            paper_id: self.paper_id.clone(),
            title: self.title.clone(),
            year: self.year,
            excerpt: truncate_with_ellipsis(&self.text, excerpt_chars),
        }
    }
}

/// Answers questions from paper text, and from figures when asked about them.
pub struct QaOrchestrator {
    ranker: TextRanker,
    generator: Arc<dyn TextGenerator>,
    describer: Arc<dyn ImageDescriber>,
    intent: FigureIntent,
    options: QaOptions,
}

impl QaOrchestrator {
    /// Create an orchestrator with default limits.
    #[must_use]
    pub fn new(
        ranker: TextRanker,
        generator: Arc<dyn TextGenerator>,
        describer: Arc<dyn ImageDescriber>,
        intent: FigureIntent,
    ) -> Self {
        Self { ranker, generator, describer, intent, options: QaOptions::default() }
    }

    /// Override the context limits.
    #[must_use]
    pub fn with_options(mut self, options: QaOptions) -> Self {
        self.options = options;
        self
    }

    /// Answer `question` using `papers`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when `papers` is empty, the question
    /// is blank, or no paper has any text. Generation failures are not errors:
    /// they produce a fallback answer with zero confidence.
    pub async fn answer(&self, papers: &[Paper], question: &str) -> ServiceResult<Answer> {
        if papers.is_empty() {
            return Err(ServiceError::validation("paper", "At least one paper is required"));
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::validation("question", "Question cannot be empty"));
        }

        let wants_figures = self.intent.matches(question);
        let mut contexts = Vec::with_capacity(papers.len());
        for paper in papers {
            if let Some(context) = self.paper_context(paper, question, wants_figures).await {
                contexts.push(context);
            }
        }
        if contexts.is_empty() {
            return Err(ServiceError::validation("paper", "No relevant content found"));
        }

        let (selected, combined) = if papers.len() == 1 {
            let combined = contexts[0].text.clone();
            (contexts, combined)
        } else {
            let selected = self.top_contexts(contexts, question).await;
            let combined = selected
                .iter()
                .map(|c| format!("From {} ({}):\n{}", c.title, c.year, c.text))
                .collect::<Vec<_>>()
                .join("\n\n");
            (selected, combined)
        };

        let prompt = format!("Context:\n{combined}\n\nQuestion: {question}\nAnswer:");
        let request = GenerationRequest::new(prompt, GenerationOptions::ANSWER);

        let (answer, confidence) = match self.generator.generate(&request).await {
            Ok(text) => (text, self.confidence(question, &selected).await),
            Err(e) => {
                tracing::warn!(error = %e, "Answer generation failed");
                (GENERATION_FAILED.to_string(), 0.0)
            }
        };

        tracing::info!(
            papers = papers.len(),
            contexts = selected.len(),
            figures = wants_figures,
            confidence,
            "Question answered"
        );

        Ok(Answer {
            answer,
            confidence,
            sources: selected.iter().map(|c| c.source(self.options.excerpt_chars)).collect(),
            context_used: truncate(&combined, self.options.context_chars),
        })
    }

    /// Relevant text of one paper, plus figure descriptions when asked about
    /// figures. `None` when the paper has nothing to contribute.
    async fn paper_context(
        &self,
        paper: &Paper,
        question: &str,
        wants_figures: bool,
    ) -> Option<PaperContext> {
        let content = paper.content();
        let mut text = if content.trim().is_empty() {
            String::new()
        } else {
            match self.ranker.extract_relevant(content, question, self.options.max_chunks).await {
                Ok(relevant) => relevant,
                Err(e) => {
                    tracing::warn!(
                        paper_id = %paper.id,
                        error = %e,
                        "Ranking failed, using leading paragraphs"
                    );
                    split_chunks(content)
                        .into_iter()
                        .take(self.options.max_chunks)
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            }
        };

        if wants_figures && paper.has_images() {
            let figures = self.describe_figures(paper).await;
            if !figures.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&figures);
            }
        }

        if text.trim().is_empty() {
            return None;
        }

        Some(PaperContext {
            paper_id: paper.id.clone(),
            title: paper.title.clone(),
            year: paper.year,
            text,
        })
    }

    async fn describe_figures(&self, paper: &Paper) -> String {
        let mut lines = Vec::new();
        for image in paper.image_list() {
            match self.describer.describe(image).await {
                Ok(description) => lines.push(format!(
                    "Figure {} ({}) on page {}: {}",
                    image.index, image.kind, image.page, description
                )),
                Err(e) => tracing::warn!(
                    paper_id = %paper.id,
                    page = image.page,
                    index = image.index,
                    error = %e,
                    "Figure description failed"
                ),
            }
        }
        lines.join("\n")
    }

    /// Best `max_contexts` contexts by relevance; input order if ranking fails.
    async fn top_contexts(&self, contexts: Vec<PaperContext>, question: &str) -> Vec<PaperContext> {
        let texts: Vec<String> = contexts.iter().map(|c| c.text.clone()).collect();

        let order: Vec<usize> = match self.ranker.rank(&texts, question).await {
            Ok(ranked) => ranked.into_iter().map(|c| c.index).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Context ranking failed, keeping paper order");
                (0..contexts.len()).collect()
            }
        };

        let mut slots: Vec<Option<PaperContext>> = contexts.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .take(self.options.max_contexts)
            .collect()
    }

    /// Best question/context similarity, clamped to `[0, 1]`.
    async fn confidence(&self, question: &str, contexts: &[PaperContext]) -> f32 {
        let texts: Vec<String> = contexts.iter().map(|c| c.text.clone()).collect();
        match self.ranker.score_best(question, &texts).await {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(_) => 0.0,
            Err(e) => {
                tracing::debug!(error = %e, "Confidence scoring failed");
                0.0
            }
        }
    }
}

impl std::fmt::Debug for QaOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaOrchestrator")
            .field("ranker", &self.ranker)
            .field("model", &self.generator.model_name())
            .field("intent", &self.intent)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
