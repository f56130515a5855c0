//! Optional bearer-token check for the API routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use axum_extra::typed_header::TypedHeaderRejection;

use super::AppState;
use super::error::ApiError;

/// Reject requests without the configured bearer token. A no-op when no
/// token is configured.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    auth: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    match auth {
        Ok(TypedHeader(Authorization(bearer))) if bearer.token() == expected => {
            next.run(request).await
        }
        _ => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
            ApiError::Unauthorized.into_response()
        }
    }
}
