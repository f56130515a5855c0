//! HTTP error responses.
//!
//! Every failure is rendered as a status code plus `{"detail": "..."}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{ClientError, ServiceError, StoreError};

/// Error returned by API handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Orchestrator or store failure
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Missing or wrong bearer token
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    /// Request body or query string could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A dependency is not ready to serve requests
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation { .. }) | Self::InvalidRequest(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Client(ClientError::RateLimited { .. })) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Service(ServiceError::Client(_)) => StatusCode::BAD_GATEWAY,
            Self::Service(ServiceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message placed in the `detail` field.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Service(err) => err.to_user_message(),
            Self::Unavailable(_) => "Service is not ready".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Service(ServiceError::Store(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(serde_json::json!({ "detail": self.detail() }))).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(ServiceError::validation("q", "bad")), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::from(ServiceError::not_found("gone")), StatusCode::NOT_FOUND),
            (
                ApiError::from(ServiceError::from(ClientError::server(500, "x"))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(StoreError::query("Neo.X", "boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[test]
    fn test_detail_hides_store_message() {
        let err = ApiError::from(StoreError::query("Neo.X", "secret internals"));
        assert!(!err.detail().contains("secret"));
    }
}
