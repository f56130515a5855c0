//! Research Assistant
//!
//! An HTTP service that searches arXiv, ingests papers into a property graph,
//! and answers questions and drafts long-form text over them with a local
//! generation engine.
//!
//! # Features
//!
//! - **Search & ingest**: arXiv topic search, PDF text and figure extraction,
//!   idempotent upsert into Neo4j or an in-process graph
//! - **Question answering**: semantic paragraph ranking, figure captioning for
//!   figure questions, confidence from question/context similarity
//! - **Writing**: improvement plans, reviews and future research directions
//! - **Resilient upstreams**: retry with exponential backoff, arXiv rate
//!   limiting and response caching
//!
//! # Example
//!
//! ```no_run
//! use research_assistant::{config::Config, server::{ApiServer, AppState}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(&config)?;
//!     ApiServer::new(state).run_http(8000).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod pdf;
pub mod ranking;
pub mod server;
pub mod services;
pub mod store;

pub use client::ArxivClient;
pub use config::Config;
pub use error::{ClientError, ServiceError, StoreError};
pub use store::PaperStore;
