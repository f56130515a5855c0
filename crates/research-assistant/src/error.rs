//! Error types for the research assistant.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Each layer has its own enum: upstream HTTP calls produce [`ClientError`], the paper
//! store produces [`StoreError`], and orchestrators surface [`ServiceError`].

use std::time::Duration;

/// Errors from the HTTP client layer (arXiv, generation engine, embeddings, PDF hosts).
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the upstream (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from upstream
        message: String,
    },

    /// Credentials rejected (401/403 response)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message from upstream
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response body was not in the expected format (XML, PDF, etc.)
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Response body exceeded the configured size limit
    #[error("Response too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Observed or declared size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Create a malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Errors from the paper store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or rejected the request.
    #[error("Store connection failed: {0}")]
    Connection(#[from] ClientError),

    /// The backend reported a query error.
    #[error("Query failed ({code}): {message}")]
    Query {
        /// Backend error code (e.g. `Neo.ClientError.Statement.SyntaxError`)
        code: String,
        /// Backend error message
        message: String,
    },

    /// A returned row could not be decoded into a paper.
    #[error("Failed to decode stored record: {0}")]
    Decode(String),
}

impl StoreError {
    /// Create a query error.
    #[must_use]
    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query { code: code.into(), message: message.into() }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors from the search, QA and writing orchestrators.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// Error from an upstream HTTP service
    #[error("Upstream error: {0}")]
    Client(#[from] ClientError),

    /// Error from the paper store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Nothing matched the request
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Convert to a message that is safe to show API clients.
    ///
    /// Upstream bodies and store messages stay in the logs.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Client(ClientError::RateLimited { retry_after }) => {
                format!("Upstream service is rate limiting requests. Retry after {:?}.", retry_after)
            }
            Self::Client(_) => "An upstream service request failed".to_string(),
            Self::Store(_) => "The paper store request failed".to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound(message) => message.clone(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for orchestrator operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_user_facing() {
        let err = ServiceError::validation("question", "question cannot be empty");
        assert_eq!(err.to_user_message(), "question cannot be empty");
    }

    #[test]
    fn test_upstream_details_are_not_exposed() {
        let err = ServiceError::from(ClientError::server(502, "stack trace from upstream"));
        assert!(!err.to_user_message().contains("stack trace"));

        let err = ServiceError::from(StoreError::query("Neo.Secret", "password=hunter2"));
        assert!(!err.to_user_message().contains("hunter2"));
    }
}
