//! In-process property graph backend.
//!
//! Mirrors the Neo4j schema with ordered sets so results are deterministic.
//! All mutation of one upsert happens under a single write lock.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::PaperStore;
use crate::error::StoreResult;
use crate::models::{ImageKey, Paper, PaperImage, RelatedPaper};

#[derive(Debug, Clone)]
struct PaperNode {
    title: String,
    r#abstract: String,
    year: i32,
    url: String,
    full_text: Option<String>,
    authors: Vec<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Graph {
    papers: BTreeMap<String, PaperNode>,
    authors: BTreeSet<String>,
    keywords: BTreeSet<String>,
    /// Image nodes keyed by structural identity, holding the encoded payload.
    images: BTreeMap<ImageKey, String>,
    /// `(author, paper_id)`
    authored: BTreeSet<(String, String)>,
    /// `(paper_id, keyword)`
    has_keyword: BTreeSet<(String, String)>,
    /// `(paper_id, image)`
    has_image: BTreeSet<(String, ImageKey)>,
}

impl Graph {
    fn keywords_of(&self, id: &str) -> Vec<String> {
        self.has_keyword
            .iter()
            .filter(|(paper, _)| paper == id)
            .map(|(_, keyword)| keyword.clone())
            .collect()
    }

    fn images_of(&self, id: &str) -> Vec<PaperImage> {
        self.has_image
            .iter()
            .filter(|(paper, _)| paper == id)
            .map(|(_, key)| PaperImage {
                page: key.page,
                index: key.index,
                kind: key.kind.clone(),
                data: self.images.get(key).cloned().unwrap_or_default(),
            })
            .collect()
    }

    fn author_names_of(&self, id: &str) -> Vec<String> {
        self.authored
            .iter()
            .filter(|(_, paper)| paper == id)
            .map(|(author, _)| author.clone())
            .collect()
    }

    fn paper(&self, id: &str, node: &PaperNode, with_images: bool) -> Paper {
        let authors = if node.authors.is_empty() {
            self.author_names_of(id)
        } else {
            node.authors.clone()
        };
        let images = with_images.then(|| self.images_of(id)).filter(|i| !i.is_empty());

        Paper {
            id: id.to_string(),
            title: node.title.clone(),
            authors,
            r#abstract: node.r#abstract.clone(),
            year: node.year,
            url: node.url.clone(),
            full_text: node.full_text.clone(),
            images,
            keywords: self.keywords_of(id),
        }
    }
}

/// Paper store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: RwLock<Graph>,
}

impl MemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paper nodes.
    pub async fn paper_count(&self) -> usize {
        self.graph.read().await.papers.len()
    }

    /// Number of author nodes.
    pub async fn author_count(&self) -> usize {
        self.graph.read().await.authors.len()
    }

    /// Number of image nodes.
    pub async fn image_count(&self) -> usize {
        self.graph.read().await.images.len()
    }

    /// When the paper node was last written.
    pub async fn updated_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.graph.read().await.papers.get(id).map(|node| node.updated_at)
    }
}

#[async_trait]
impl PaperStore for MemoryGraphStore {
    async fn upsert(&self, paper: &Paper) -> StoreResult<()> {
        let mut graph = self.graph.write().await;

        graph.papers.insert(
            paper.id.clone(),
            PaperNode {
                title: paper.title.clone(),
                r#abstract: paper.r#abstract.clone(),
                year: paper.year,
                url: paper.url.clone(),
                full_text: paper.full_text.clone(),
                authors: paper.authors.clone(),
                updated_at: Utc::now(),
            },
        );

        for author in &paper.authors {
            graph.authors.insert(author.clone());
            graph.authored.insert((author.clone(), paper.id.clone()));
        }

        for keyword in &paper.keywords {
            graph.keywords.insert(keyword.clone());
            graph.has_keyword.insert((paper.id.clone(), keyword.clone()));
        }

        for image in paper.image_list() {
            let key = image.key();
            graph.images.insert(key.clone(), image.data.clone());
            graph.has_image.insert((paper.id.clone(), key));
        }

        tracing::debug!(paper_id = %paper.id, "Stored paper in memory graph");
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Paper>> {
        let graph = self.graph.read().await;
        Ok(graph.papers.get(id).map(|node| graph.paper(id, node, true)))
    }

    async fn search(&self, keyword: &str, min_year: i32, limit: usize) -> StoreResult<Vec<Paper>> {
        let graph = self.graph.read().await;

        let mut hits: Vec<(&String, &PaperNode)> = graph
            .papers
            .iter()
            .filter(|(_, node)| node.year >= min_year)
            .filter(|(_, node)| node.title.contains(keyword) || node.r#abstract.contains(keyword))
            .collect();

        // BTreeMap iteration is already id-ascending; stable sort keeps it within a year.
        hits.sort_by(|a, b| b.1.year.cmp(&a.1.year));

        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(id, node)| graph.paper(id, node, false))
            .collect())
    }

    async fn related(&self, id: &str, limit: usize) -> StoreResult<Vec<RelatedPaper>> {
        let graph = self.graph.read().await;

        let source: BTreeSet<String> = graph.keywords_of(id).into_iter().collect();
        if source.is_empty() {
            return Ok(Vec::new());
        }

        let mut shared: BTreeMap<&str, u64> = BTreeMap::new();
        for (paper, keyword) in &graph.has_keyword {
            if paper != id && source.contains(keyword) {
                *shared.entry(paper.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, u64)> = shared.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .filter_map(|(paper_id, count)| {
                graph.papers.get(paper_id).map(|node| RelatedPaper {
                    paper: graph.paper(paper_id, node, false),
                    shared_keywords: count,
                })
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, title: &str, year: i32, keywords: &[&str]) -> Paper {
        Paper {
            id: id.to_string(),
            title: title.to_string(),
            authors: vec!["Ada".to_string()],
            r#abstract: format!("Abstract of {title}"),
            year,
            url: format!("https://arxiv.org/pdf/{id}"),
            keywords: keywords.iter().map(ToString::to_string).collect(),
            ..Paper::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = MemoryGraphStore::new();
        store.upsert(&paper("p1", "Quantum", 2021, &["qc"])).await.unwrap();

        let got = store.get("p1").await.unwrap().unwrap();
        assert_eq!(got.title, "Quantum");
        assert_eq!(got.keywords, vec!["qc".to_string()]);
        assert!(got.images.is_none());
        assert!(store.updated_at("p1").await.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryGraphStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_author_nodes_shared_between_papers() {
        let store = MemoryGraphStore::new();
        store.upsert(&paper("p1", "A", 2020, &[])).await.unwrap();
        store.upsert(&paper("p2", "B", 2020, &[])).await.unwrap();
        assert_eq!(store.author_count().await, 1);
    }

    #[tokio::test]
    async fn test_related_without_keywords_is_empty() {
        let store = MemoryGraphStore::new();
        store.upsert(&paper("p1", "A", 2020, &[])).await.unwrap();
        store.upsert(&paper("p2", "B", 2020, &[])).await.unwrap();
        assert!(store.related("p1", 5).await.unwrap().is_empty());
    }
}
