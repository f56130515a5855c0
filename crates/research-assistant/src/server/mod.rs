//! HTTP API server.
//!
//! JSON routes over the orchestrators and the paper store, with:
//! - Optional bearer-token auth on every route except `/health` and `/ready`
//! - Permissive CORS and request tracing via tower-http
//! - Graceful shutdown on Ctrl+C

mod auth;
mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

use crate::client::{ArxivClient, build_http_client};
use crate::config::Config;
use crate::generation::{describer_from_config, generator_from_config};
use crate::pdf::PdfExtractor;
use crate::ranking::{TextRanker, embedder_from_config};
use crate::services::{FigureIntent, QaOrchestrator, SearchOrchestrator, WritingOrchestrator};
use crate::store::{self, PaperStore};

/// Shared state for API handlers.
pub struct AppState {
    /// Search and ingestion.
    pub search: SearchOrchestrator,
    /// Question answering.
    pub qa: QaOrchestrator,
    /// Plans, reviews and future work.
    pub writing: WritingOrchestrator,
    /// Paper store used by the lookup routes.
    pub store: Arc<dyn PaperStore>,
    /// Bearer token required on API routes, if any.
    pub auth_token: Option<String>,
}

impl AppState {
    /// Wire every component from the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client or the store backend cannot be built.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = build_http_client(config)?;
        let store = store::from_config(config)?;

        let arxiv = ArxivClient::with_client(http.clone(), config);
        let extractor = PdfExtractor::with_client(http.clone(), config);
        let search =
            SearchOrchestrator::new(arxiv, extractor, Arc::clone(&store), config.ingest_concurrency);

        let ranker = TextRanker::new(embedder_from_config(http.clone(), config), config);
        let generator = generator_from_config(http.clone(), config);
        let describer = describer_from_config(http, config);
        let qa = QaOrchestrator::new(
            ranker,
            Arc::clone(&generator),
            describer,
            FigureIntent::from_config(config),
        );
        let writing = WritingOrchestrator::new(generator);

        Ok(Self { search, qa, writing, store, auth_token: config.auth_token.clone() })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("search", &self.search)
            .field("qa", &self.qa)
            .field("writing", &self.writing)
            .field("auth", &self.auth_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Build the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/search", post(routes::search))
        .route("/answer", post(routes::answer))
        .route("/future_work", post(routes::future_work))
        .route("/improvement_plan", post(routes::improvement_plan))
        .route("/review", post(routes::review))
        .route("/papers", get(routes::list_papers))
        .route("/papers/{id}", get(routes::get_paper))
        .route("/papers/{id}/related", get(routes::related_papers))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/ready", get(routes::ready))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Research assistant HTTP server.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a server over prepared state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state: Arc::new(state) }
    }

    /// Shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Serve until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server fails.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        if let Err(e) = self.state.store.ensure_schema().await {
            tracing::warn!(error = %e, "Could not ensure store schema");
        }

        let router = create_router(Arc::clone(&self.state));
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!(
            store = self.state.store.backend_name(),
            auth = self.state.auth_token.is_some(),
            "HTTP server listening on http://{}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for ApiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiServer").field("state", &self.state).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
