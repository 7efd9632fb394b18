//! JSON "about" endpoints: payload classification and the mirror checker.

use super::checker::{profile_url, Checker};
use super::fetch::{FetchError, Fetcher};
use super::status::CheckStatus;
use crate::transport::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct AboutResponse {
    data: Option<AboutData>,
}

#[derive(Debug, Deserialize)]
struct AboutData {
    name: Option<String>,
    is_suspended: Option<bool>,
    #[serde(rename = "isSuspended")]
    is_suspended_camel: Option<bool>,
    suspended: Option<bool>,
}

impl AboutData {
    fn suspended(&self) -> bool {
        self.is_suspended
            .or(self.is_suspended_camel)
            .or(self.suspended)
            .unwrap_or(false)
    }
}

/// Classify a JSON about payload for `username`.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the body is not an about payload.
pub fn classify_about_body(body: &str, username: &str) -> Result<CheckStatus, FetchError> {
    let parsed: AboutResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let Some(data) = parsed.data else {
        return Ok(CheckStatus::NotFound);
    };

    if data.suspended() {
        return Ok(CheckStatus::Suspended);
    }

    match data.name {
        Some(name) if name.eq_ignore_ascii_case(username) => Ok(CheckStatus::Exists),
        _ => Ok(CheckStatus::NotFound),
    }
}

/// Classify a full about response: 404 is an explicit not-found, 2xx is
/// parsed, anything else is an error.
///
/// # Errors
///
/// Returns the [`FetchError`] describing why the response is inconclusive.
pub fn classify_about_response(
    response: &HttpResponse,
    username: &str,
) -> Result<CheckStatus, FetchError> {
    if response.status == 404 {
        return Ok(CheckStatus::NotFound);
    }
    if !response.is_success() {
        return Err(FetchError::from_status(response.status));
    }
    classify_about_body(&response.body, username)
}

/// An unauthenticated JSON about endpoint on one mirror host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEndpoint {
    /// Host base URL, e.g. `https://www.reddit.com`.
    pub base: String,
    /// Final path segment, e.g. `about.json`.
    pub suffix: String,
}

impl MirrorEndpoint {
    /// Create an endpoint.
    #[must_use]
    pub fn new(base: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            suffix: suffix.into(),
        }
    }

    /// The default mirror list, in trial order.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("https://www.reddit.com", "about.json"),
            Self::new("https://api.reddit.com", "about"),
            Self::new("https://old.reddit.com", "about.json"),
        ]
    }

    /// URL for `username`.
    #[must_use]
    pub fn url_for(&self, username: &str) -> Option<String> {
        profile_url(&self.base, username, &[self.suffix.as_str()])
    }
}

/// Checks one JSON mirror.
pub struct AboutJsonChecker {
    endpoint: MirrorEndpoint,
    fetcher: Arc<Fetcher>,
    label: String,
}

impl AboutJsonChecker {
    /// Create a checker for `endpoint`.
    #[must_use]
    pub fn new(endpoint: MirrorEndpoint, fetcher: Arc<Fetcher>) -> Self {
        let label = format!("about-json({})", endpoint.base);
        Self {
            endpoint,
            fetcher,
            label,
        }
    }

    async fn check(&self, username: &str) -> Result<CheckStatus, FetchError> {
        let url = self
            .endpoint
            .url_for(username)
            .ok_or_else(|| FetchError::Parse(format!("bad mirror base {}", self.endpoint.base)))?;
        let response = self
            .fetcher
            .fetch(HttpRequest::get(url).header("Accept", "application/json"))
            .await?;
        classify_about_response(&response, username)
    }
}

#[async_trait]
impl Checker for AboutJsonChecker {
    fn name(&self) -> &str {
        &self.label
    }

    async fn attempt(&self, username: &str) -> CheckStatus {
        match self.check(username).await {
            Ok(status) => status,
            Err(FetchError::Network(e)) => {
                warn!("Failed to verify reddit username {username} via {}: {e}", self.label);
                CheckStatus::Unavailable
            }
            Err(e) => {
                debug!("{} inconclusive for {username}: {e}", self.label);
                CheckStatus::Unavailable
            }
        }
    }
}
