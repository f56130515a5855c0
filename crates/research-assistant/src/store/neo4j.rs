//! Neo4j backend over the HTTP transactional Cypher endpoint.
//!
//! Each operation is one statement posted to `/db/{database}/tx/commit`, so
//! Neo4j runs it in its own implicit transaction: an upsert either lands
//! completely or not at all.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{Value, json};

use super::PaperStore;
use crate::client::{build_http_client, check_status};
use crate::config::Config;
use crate::error::{ClientError, StoreError, StoreResult};
use crate::models::{Paper, RelatedPaper};

const UPSERT_PAPER: &str = "\
MERGE (p:Paper {id: $id})
SET p.title = $title,
    p.abstract = $abstract,
    p.year = $year,
    p.url = $url,
    p.full_text = $full_text,
    p.authors = $authors,
    p.updated_at = datetime()
FOREACH (name IN $authors |
    MERGE (a:Author {name: name})
    MERGE (a)-[:AUTHORED]->(p))
FOREACH (keyword IN $keywords |
    MERGE (k:Keyword {name: keyword})
    MERGE (p)-[:HAS_KEYWORD]->(k))
FOREACH (image IN $images |
    MERGE (i:Image {page: image.page, index: image.index, type: image.type})
    SET i.data = image.data
    MERGE (p)-[:HAS_IMAGE]->(i))
RETURN p.id";

const GET_PAPER: &str = "\
MATCH (p:Paper {id: $id})
OPTIONAL MATCH (a:Author)-[:AUTHORED]->(p)
WITH p, collect(DISTINCT a.name) AS author_names
OPTIONAL MATCH (p)-[:HAS_KEYWORD]->(k:Keyword)
WITH p, author_names, collect(DISTINCT k.name) AS keywords
OPTIONAL MATCH (p)-[:HAS_IMAGE]->(i:Image)
WITH p, author_names, keywords,
     collect(DISTINCT i {.page, .index, .type, .data}) AS images
RETURN {
    id: p.id,
    title: coalesce(p.title, ''),
    authors: CASE WHEN size(coalesce(p.authors, [])) > 0 THEN p.authors ELSE author_names END,
    abstract: coalesce(p.abstract, ''),
    year: coalesce(p.year, 0),
    url: coalesce(p.url, ''),
    full_text: p.full_text,
    images: images,
    keywords: keywords
} AS paper";

const SEARCH_PAPERS: &str = "\
MATCH (p:Paper)
WHERE p.year >= $min_year AND (p.title CONTAINS $keyword OR p.abstract CONTAINS $keyword)
WITH p ORDER BY p.year DESC, p.id ASC LIMIT $limit
OPTIONAL MATCH (a:Author)-[:AUTHORED]->(p)
WITH p, collect(DISTINCT a.name) AS author_names
OPTIONAL MATCH (p)-[:HAS_KEYWORD]->(k:Keyword)
WITH p, author_names, collect(DISTINCT k.name) AS keywords
RETURN {
    id: p.id,
    title: coalesce(p.title, ''),
    authors: CASE WHEN size(coalesce(p.authors, [])) > 0 THEN p.authors ELSE author_names END,
    abstract: coalesce(p.abstract, ''),
    year: coalesce(p.year, 0),
    url: coalesce(p.url, ''),
    full_text: p.full_text,
    keywords: keywords
} AS paper
ORDER BY paper.year DESC, paper.id ASC";

const RELATED_PAPERS: &str = "\
MATCH (p:Paper {id: $id})-[:HAS_KEYWORD]->(k:Keyword)<-[:HAS_KEYWORD]-(other:Paper)
WHERE other.id <> $id
WITH other, count(DISTINCT k) AS shared
ORDER BY shared DESC, other.id ASC LIMIT $limit
OPTIONAL MATCH (a:Author)-[:AUTHORED]->(other)
WITH other, shared, collect(DISTINCT a.name) AS author_names
OPTIONAL MATCH (other)-[:HAS_KEYWORD]->(k2:Keyword)
WITH other, shared, author_names, collect(DISTINCT k2.name) AS keywords
RETURN {
    id: other.id,
    title: coalesce(other.title, ''),
    authors: CASE WHEN size(coalesce(other.authors, [])) > 0 THEN other.authors ELSE author_names END,
    abstract: coalesce(other.abstract, ''),
    year: coalesce(other.year, 0),
    url: coalesce(other.url, ''),
    full_text: other.full_text,
    keywords: keywords
} AS paper, shared
ORDER BY shared DESC, paper.id ASC";

const SCHEMA: &[&str] = &[
    "CREATE CONSTRAINT paper_id IF NOT EXISTS FOR (p:Paper) REQUIRE p.id IS UNIQUE",
    "CREATE CONSTRAINT author_name IF NOT EXISTS FOR (a:Author) REQUIRE a.name IS UNIQUE",
    "CREATE CONSTRAINT keyword_name IF NOT EXISTS FOR (k:Keyword) REQUIRE k.name IS UNIQUE",
    "CREATE INDEX paper_year IF NOT EXISTS FOR (p:Paper) ON (p.year)",
];

/// Transactional endpoint response envelope.
#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Paper store backed by a Neo4j server.
#[derive(Clone)]
pub struct Neo4jStore {
    client: ClientWithMiddleware,
    endpoint: String,
    user: String,
    password: String,
}

impl Neo4jStore {
    /// Create a store for the configured Neo4j server.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Create a store that shares an existing HTTP client.
    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, config: &Config) -> Self {
        let endpoint = format!(
            "{}/db/{}/tx/commit",
            config.neo4j_uri.trim_end_matches('/'),
            config.neo4j_database
        );
        Self {
            client,
            endpoint,
            user: config.neo4j_user.clone(),
            password: config.neo4j_password.clone(),
        }
    }

    /// Run a single statement and return the rows of its result.
    async fn run(&self, statement: &str, parameters: Value) -> StoreResult<Vec<Vec<Value>>> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });
        let body_str = serde_json::to_string(&body)?;

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body_str)
            .send()
            .await
            .map_err(ClientError::from)?;

        let response = check_status(response).await?;
        let tx: TxResponse = response.json().await.map_err(ClientError::from)?;

        if let Some(err) = tx.errors.into_iter().next() {
            tracing::warn!(code = %err.code, "Cypher statement failed");
            return Err(StoreError::query(err.code, err.message));
        }

        Ok(tx
            .results
            .into_iter()
            .next()
            .map(|result| result.data.into_iter().map(|r| r.row).collect())
            .unwrap_or_default())
    }
}

/// Decode the `paper` column of a row.
fn decode_paper(value: Option<Value>) -> StoreResult<Paper> {
    let value = value.ok_or_else(|| StoreError::decode("row without a paper column"))?;
    let mut paper: Paper = serde_json::from_value(value)?;
    if paper.images.as_ref().is_some_and(Vec::is_empty) {
        paper.images = None;
    }
    Ok(paper)
}

#[async_trait]
impl PaperStore for Neo4jStore {
    async fn upsert(&self, paper: &Paper) -> StoreResult<()> {
        let parameters = json!({
            "id": paper.id,
            "title": paper.title,
            "abstract": paper.r#abstract,
            "year": paper.year,
            "url": paper.url,
            "full_text": paper.full_text,
            "authors": paper.authors,
            "keywords": paper.keywords,
            "images": paper.image_list(),
        });

        self.run(UPSERT_PAPER, parameters).await?;
        tracing::debug!(paper_id = %paper.id, "Stored paper in Neo4j");
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Paper>> {
        let rows = self.run(GET_PAPER, json!({ "id": id })).await?;
        rows.into_iter().next().map(|row| decode_paper(row.into_iter().next())).transpose()
    }

    async fn search(&self, keyword: &str, min_year: i32, limit: usize) -> StoreResult<Vec<Paper>> {
        let parameters = json!({ "keyword": keyword, "min_year": min_year, "limit": limit });
        let rows = self.run(SEARCH_PAPERS, parameters).await?;
        rows.into_iter().map(|row| decode_paper(row.into_iter().next())).collect()
    }

    async fn related(&self, id: &str, limit: usize) -> StoreResult<Vec<RelatedPaper>> {
        let rows = self.run(RELATED_PAPERS, json!({ "id": id, "limit": limit })).await?;

        rows.into_iter()
            .map(|row| {
                let mut columns = row.into_iter();
                let paper = decode_paper(columns.next())?;
                let shared_keywords = columns
                    .next()
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| StoreError::decode("row without a shared keyword count"))?;
                Ok(RelatedPaper { paper, shared_keywords })
            })
            .collect()
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            self.run(statement, json!({})).await?;
        }
        tracing::info!("Neo4j constraints and indexes ensured");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run("RETURN 1", json!({})).await.map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "neo4j"
    }
}

impl std::fmt::Debug for Neo4jStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jStore")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_database() {
        let mut config = Config::for_testing("http://db:7474/");
        config.neo4j_database = "papers".to_string();
        let store = Neo4jStore::new(&config).unwrap();
        assert!(format!("{store:?}").contains("http://db:7474/db/papers/tx/commit"));
    }

    #[test]
    fn test_debug_hides_password() {
        let store = Neo4jStore::new(&Config::for_testing("http://db:7474")).unwrap();
        assert!(!format!("{store:?}").contains("test\""));
    }

    #[test]
    fn test_decode_paper_drops_empty_images() {
        let value = json!({
            "id": "p1", "title": "T", "authors": ["A"], "abstract": "",
            "year": 2020, "url": "", "full_text": null, "images": [], "keywords": []
        });
        let paper = decode_paper(Some(value)).unwrap();
        assert!(paper.images.is_none());
        assert!(paper.full_text.is_none());
    }

    #[test]
    fn test_decode_paper_missing_column() {
        assert!(matches!(decode_paper(None), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_upsert_statement_never_deletes() {
        assert!(!UPSERT_PAPER.contains("DELETE"));
        assert!(UPSERT_PAPER.starts_with("MERGE (p:Paper {id: $id})"));
    }

    #[test]
    fn test_reads_fall_back_to_authored_edges_when_list_empty() {
        for statement in [GET_PAPER, SEARCH_PAPERS] {
            assert!(statement.contains(
                "CASE WHEN size(coalesce(p.authors, [])) > 0 THEN p.authors ELSE author_names END"
            ));
        }
        assert!(RELATED_PAPERS.contains(
            "CASE WHEN size(coalesce(other.authors, [])) > 0 THEN other.authors ELSE author_names END"
        ));
    }
}
