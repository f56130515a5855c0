//! Upstream HTTP clients.
//!
//! Every upstream (arXiv, Neo4j, generation engine, embeddings, PDF hosts) shares the
//! same construction:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff (configured retry count and delay)
//! - Uniform status-code mapping into [`ClientError`]

mod arxiv;
mod atom;

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

pub use arxiv::{ArxivClient, ArxivEntry};
pub use atom::parse_feed;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// Upper bound for a single backoff interval.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Build the pooled HTTP client with retry middleware.
///
/// # Errors
///
/// Returns error if HTTP client initialization fails.
pub fn build_http_client(config: &Config) -> anyhow::Result<ClientWithMiddleware> {
    let client = Client::builder()
        .user_agent(concat!("research-assistant/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(api::MAX_KEEPALIVE)
        .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
        .gzip(true)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(config.retry_delay, MAX_BACKOFF.max(config.retry_delay))
        .build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Map non-success status codes to [`ClientError`].
pub(crate) async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::rate_limited(retry_after))
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::not_found(text))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::bad_request(text))
        }
        401 | 403 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::Unauthorized { message: text })
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::server(status.as_u16(), text))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
        }
    }
}

/// Generate a cache key for a GET request.
pub(crate) fn cache_key(url: &str, params: &[(String, String)]) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(b"GET|");
    hasher.update(url.as_bytes());
    hasher.update(b"|");

    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{:x}", hasher.finalize())
}
