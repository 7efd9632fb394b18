//! Timed, retried request execution shared by every checker.

use super::retry::RetryPolicy;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons an endpoint could not produce a clean classification.
///
/// These never leave the `reddit` module: the verifier folds every one of
/// them into [`super::CheckStatus::Unavailable`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout or connection failure after all retries.
    #[error("network failure: {0}")]
    Network(#[from] TransportError),

    /// Unexpected non-2xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// 404 from an endpoint that should not return one.
    #[error("not found")]
    NotFound,

    /// 429, 403 or 5xx.
    #[error("rate limited or blocked (HTTP {0})")]
    RateLimited(u16),

    /// Body could not be parsed.
    #[error("malformed response: {0}")]
    Parse(String),

    /// Credentials missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl FetchError {
    /// Map a non-success status to its taxonomy entry.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            403 | 429 | 500..=599 => Self::RateLimited(status),
            other => Self::HttpStatus(other),
        }
    }
}

/// Executes requests through a transport with a per-attempt timeout,
/// a retry policy and a fixed User-Agent.
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    timeout: Duration,
    user_agent: String,
    attempts: AtomicU64,
}

impl Fetcher {
    /// Create a fetcher.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            retry,
            timeout,
            user_agent: user_agent.into(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Send `request`, retrying network failures.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if every attempt failed without a response.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let request = if request.header_value("User-Agent").is_some() {
            request
        } else {
            request.header("User-Agent", self.user_agent.clone())
        };

        let response = self
            .retry
            .run(|_| {
                self.attempts.fetch_add(1, Ordering::Relaxed);
                let request = &request;
                async move {
                    match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(TransportError::Timeout),
                    }
                }
            })
            .await?;

        Ok(response)
    }

    /// Total network attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// User-Agent sent when the request carries none.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
