//! Behavioural and property tests for the in-memory graph store.

mod common;

use proptest::prelude::*;
use research_assistant::models::Paper;
use research_assistant::store::{MemoryGraphStore, PaperStore};

use common::{image, paper};

fn with_keywords(mut p: Paper, keywords: &[&str]) -> Paper {
    p.keywords = keywords.iter().map(ToString::to_string).collect();
    p
}

#[tokio::test]
async fn test_upsert_same_id_overwrites_without_duplicating() {
    let store = MemoryGraphStore::new();

    store.upsert(&paper("p1", "First Title", 2020)).await.unwrap();
    let first_write = store.updated_at("p1").await.unwrap();

    let mut updated = paper("p1", "Second Title", 2021);
    updated.full_text = Some("Body text".to_string());
    store.upsert(&updated).await.unwrap();

    assert_eq!(store.paper_count().await, 1);
    let got = store.get("p1").await.unwrap().unwrap();
    assert_eq!(got.title, "Second Title");
    assert_eq!(got.year, 2021);
    assert_eq!(got.full_text.as_deref(), Some("Body text"));
    assert!(store.updated_at("p1").await.unwrap() >= first_write);
}

#[tokio::test]
async fn test_authors_are_shared_nodes() {
    let store = MemoryGraphStore::new();

    let mut a = paper("a", "Alpha", 2020);
    a.authors = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];
    let mut b = paper("b", "Beta", 2021);
    b.authors = vec!["Ada Lovelace".to_string()];

    store.upsert(&a).await.unwrap();
    store.upsert(&b).await.unwrap();

    assert_eq!(store.author_count().await, 2);
    let got = store.get("a").await.unwrap().unwrap();
    assert_eq!(got.authors, vec!["Ada Lovelace", "Alan Turing"]);
}

#[tokio::test]
async fn test_empty_author_list_falls_back_to_authored_edges() {
    let store = MemoryGraphStore::new();

    store.upsert(&paper("p1", "Ledger", 2020)).await.unwrap();
    let mut anonymous = paper("p1", "Ledger", 2020);
    anonymous.authors = Vec::new();
    store.upsert(&anonymous).await.unwrap();

    let got = store.get("p1").await.unwrap().unwrap();
    assert_eq!(got.authors, vec!["Ada Lovelace"]);

    let found = store.search("Ledger", 0, 10).await.unwrap();
    assert_eq!(found[0].authors, vec!["Ada Lovelace"]);
}

#[tokio::test]
async fn test_images_round_trip_through_get_only() {
    let store = MemoryGraphStore::new();

    let mut p = paper("img", "Figures Everywhere", 2022);
    p.images = Some(vec![image(1, 1, "png"), image(2, 1, "jpeg")]);
    store.upsert(&p).await.unwrap();

    assert_eq!(store.image_count().await, 2);

    let got = store.get("img").await.unwrap().unwrap();
    let images = got.images.unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().any(|i| i.page == 2 && i.kind == "jpeg"));

    let listed = store.search("Figures", 0, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].images.is_none());
}

#[tokio::test]
async fn test_search_filters_and_orders_newest_first() {
    let store = MemoryGraphStore::new();

    store.upsert(&paper("c", "Graph Kernels", 2019)).await.unwrap();
    store.upsert(&paper("b", "Graph Networks", 2023)).await.unwrap();
    store.upsert(&paper("a", "Graph Transformers", 2023)).await.unwrap();
    store.upsert(&paper("d", "Compilers", 2024)).await.unwrap();

    let hits = store.search("Graph", 2020, 10).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    // Matching is case-sensitive.
    assert!(store.search("graph", 0, 10).await.unwrap().is_empty());

    // The abstract is searched too.
    let hits = store.search("Compilers abstract", 0, 10).await.unwrap();
    assert_eq!(hits.len(), 1);

    let limited = store.search("Graph", 0, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, "a");
}

#[tokio::test]
async fn test_related_ranks_by_shared_keywords() {
    let store = MemoryGraphStore::new();

    store
        .upsert(&with_keywords(paper("src", "Source", 2020), &["ml", "graphs", "nlp"]))
        .await
        .unwrap();
    store.upsert(&with_keywords(paper("one", "One", 2020), &["ml"])).await.unwrap();
    store
        .upsert(&with_keywords(paper("two", "Two", 2020), &["ml", "graphs"]))
        .await
        .unwrap();
    store.upsert(&with_keywords(paper("zero", "Zero", 2020), &["vision"])).await.unwrap();
    store.upsert(&with_keywords(paper("also", "Also", 2020), &["nlp"])).await.unwrap();

    let related = store.related("src", 10).await.unwrap();
    let ranked: Vec<(&str, u64)> =
        related.iter().map(|r| (r.paper.id.as_str(), r.shared_keywords)).collect();
    assert_eq!(ranked, vec![("two", 2), ("also", 1), ("one", 1)]);

    let limited = store.related("src", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].paper.id, "two");
}

#[tokio::test]
async fn test_related_for_unknown_paper_is_empty() {
    let store = MemoryGraphStore::new();
    store.upsert(&with_keywords(paper("a", "A", 2020), &["ml"])).await.unwrap();
    assert!(store.related("missing", 5).await.unwrap().is_empty());
}

fn arb_paper() -> impl Strategy<Value = Paper> {
    (
        "[a-e]",
        prop::sample::select(vec!["Deep Graphs", "Shallow Nets", "Graph Theory", "Optics"]),
        2015..2025i32,
        prop::collection::vec(prop::sample::select(vec!["ml", "graphs", "optics", "nlp"]), 0..3),
    )
        .prop_map(|(id, title, year, keywords)| {
            with_keywords(paper(&id, title, year), &keywords)
        })
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

proptest! {
    #[test]
    fn search_results_respect_filters(
        papers in prop::collection::vec(arb_paper(), 0..12),
        min_year in 2015..2025i32,
        limit in 0..6usize,
    ) {
        let hits = block_on(async {
            let store = MemoryGraphStore::new();
            for p in &papers {
                store.upsert(p).await.unwrap();
            }
            store.search("Graph", min_year, limit).await.unwrap()
        });

        prop_assert!(hits.len() <= limit);
        for hit in &hits {
            prop_assert!(hit.year >= min_year);
            prop_assert!(hit.title.contains("Graph") || hit.r#abstract.contains("Graph"));
        }
        for pair in hits.windows(2) {
            prop_assert!(
                pair[0].year > pair[1].year
                    || (pair[0].year == pair[1].year && pair[0].id < pair[1].id)
            );
        }
    }

    #[test]
    fn related_excludes_source_and_is_ordered(
        papers in prop::collection::vec(arb_paper(), 1..12),
        limit in 0..6usize,
    ) {
        let source = papers[0].id.clone();
        let (related, ids) = block_on(async {
            let store = MemoryGraphStore::new();
            for p in &papers {
                store.upsert(p).await.unwrap();
            }
            let related = store.related(&source, limit).await.unwrap();
            (related, store.paper_count().await)
        });

        prop_assert!(related.len() <= limit);
        prop_assert!(related.len() < ids.max(1));
        for r in &related {
            prop_assert_ne!(&r.paper.id, &source);
            prop_assert!(r.shared_keywords >= 1);
        }
        for pair in related.windows(2) {
            prop_assert!(
                pair[0].shared_keywords > pair[1].shared_keywords
                    || (pair[0].shared_keywords == pair[1].shared_keywords
                        && pair[0].paper.id < pair[1].paper.id)
            );
        }
    }

    #[test]
    fn repeated_upserts_keep_one_node_per_id(papers in prop::collection::vec(arb_paper(), 0..16)) {
        let (count, last_titles) = block_on(async {
            let store = MemoryGraphStore::new();
            for p in &papers {
                store.upsert(p).await.unwrap();
            }
            let mut titles = Vec::new();
            for p in &papers {
                let got = store.get(&p.id).await.unwrap().unwrap();
                titles.push((p.id.clone(), got.title));
            }
            (store.paper_count().await, titles)
        });

        let distinct: std::collections::BTreeSet<&str> =
            papers.iter().map(|p| p.id.as_str()).collect();
        prop_assert_eq!(count, distinct.len());

        for (id, title) in last_titles {
            let expected = papers.iter().rev().find(|p| p.id == id).map(|p| p.title.clone());
            prop_assert_eq!(Some(title), expected);
        }
    }
}
