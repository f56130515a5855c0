//! API route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::error::ServiceError;
use crate::models::{
    Answer, FutureWork, ImprovementPlan, Paper, PaperIdsRequest, PaperList, QuestionRequest,
    RelatedList, RelatedQuery, Review, ReviewRequest, SearchRequest, SearchResponse,
    StoreSearchQuery,
};

/// Upper bound on papers returned by store listings.
const MAX_LIST_LIMIT: usize = 1000;

/// `POST /search`
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(req) = payload?;
    tracing::info!(topic = %req.topic, max_results = req.max_results, "Search request");
    Ok(Json(state.search.search(&req.topic, req.max_results).await?))
}

/// `POST /answer`
pub async fn answer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> ApiResult<Json<Answer>> {
    let Json(req) = payload?;
    Ok(Json(state.qa.answer(&req.paper, &req.question).await?))
}

/// `POST /future_work`
pub async fn future_work(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PaperIdsRequest>, JsonRejection>,
) -> ApiResult<Json<FutureWork>> {
    let Json(req) = payload?;
    let papers = resolve_papers(&state, &req.paper_ids, "future work generation").await?;
    Ok(Json(state.writing.future_work(&papers).await?))
}

/// `POST /improvement_plan`
pub async fn improvement_plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PaperIdsRequest>, JsonRejection>,
) -> ApiResult<Json<ImprovementPlan>> {
    let Json(req) = payload?;
    let papers = resolve_papers(&state, &req.paper_ids, "improvement plan creation").await?;
    Ok(Json(state.writing.improvement_plan(&papers).await?))
}

/// `POST /review`
pub async fn review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<Review>> {
    let Json(req) = payload?;
    Ok(Json(state.writing.review(&req.paper).await?))
}

/// `GET /papers`
pub async fn list_papers(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StoreSearchQuery>, QueryRejection>,
) -> ApiResult<Json<PaperList>> {
    let Query(query) = query?;
    let limit = query.limit.min(MAX_LIST_LIMIT);
    let papers = state.store.search(&query.q, query.min_year, limit).await?;
    Ok(Json(PaperList { count: papers.len(), papers }))
}

/// `GET /papers/{id}`
pub async fn get_paper(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Paper>> {
    let Path(id) = id?;
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::not_found(format!("Paper {id} not found")).into())
}

/// `GET /papers/{id}/related`
pub async fn related_papers(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
    query: Result<Query<RelatedQuery>, QueryRejection>,
) -> ApiResult<Json<RelatedList>> {
    let Path(id) = id?;
    let Query(query) = query?;

    if state.store.get(&id).await?.is_none() {
        return Err(ServiceError::not_found(format!("Paper {id} not found")).into());
    }

    let papers = state.store.related(&id, query.limit.min(MAX_LIST_LIMIT)).await?;
    Ok(Json(RelatedList { count: papers.len(), papers }))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "research-assistant",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `GET /ready`
pub async fn ready(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Store readiness check failed");
        ApiError::Unavailable(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "status": "ready",
        "service": "research-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend_name()
    })))
}

/// Look up stored papers by id, skipping unknown ids.
async fn resolve_papers(
    state: &AppState,
    ids: &[String],
    purpose: &str,
) -> ApiResult<Vec<Paper>> {
    let mut papers = Vec::with_capacity(ids.len());
    for id in ids {
        match state.store.get(id).await? {
            Some(paper) => papers.push(paper),
            None => tracing::debug!(paper_id = %id, "Skipping unknown paper id"),
        }
    }

    if papers.is_empty() {
        return Err(ServiceError::not_found(format!("No valid papers found for {purpose}")).into());
    }
    Ok(papers)
}
