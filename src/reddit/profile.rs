//! HTML profile page fallback.
//!
//! Last resort of the public path: fetch the profile page and look for the
//! phrases Reddit shows for suspended, missing and live accounts.

use super::checker::{profile_url, Checker};
use super::fetch::{FetchError, Fetcher};
use super::status::CheckStatus;
use crate::html::html_to_text;
use crate::transport::HttpRequest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SUSPENDED_PHRASES: &[&str] = &["account has been suspended"];

const NOT_FOUND_PHRASES: &[&str] = &[
    "nobody on reddit goes by that name",
    "this account has been deleted",
    "sorry, something went wrong",
    "page not found",
];

const LIVE_MARKUP: &[&str] = &[
    "<shreddit-profile",
    "<shreddit-post",
    "data-testid=\"profile",
    "profile-user-name",
    "\"user\":{",
];

/// Classify a profile page by phrase.
///
/// Visible text is checked for suspension and not-found banners first; raw
/// markup is then checked for live profile elements.
#[must_use]
pub fn classify_profile_html(html: &str) -> CheckStatus {
    let text = html_to_text(html).to_lowercase();

    if SUSPENDED_PHRASES.iter().any(|p| text.contains(p)) {
        return CheckStatus::Suspended;
    }
    if NOT_FOUND_PHRASES.iter().any(|p| text.contains(p)) {
        return CheckStatus::NotFound;
    }

    let markup = html.to_lowercase();
    if LIVE_MARKUP.iter().any(|m| markup.contains(m)) {
        return CheckStatus::Exists;
    }

    CheckStatus::Unavailable
}

/// Scrapes `{base}/user/{name}/`.
pub struct HtmlProfileChecker {
    base: String,
    fetcher: Arc<Fetcher>,
}

impl HtmlProfileChecker {
    /// Default profile host.
    pub const DEFAULT_BASE: &'static str = "https://www.reddit.com";

    /// Create a checker against `base`.
    #[must_use]
    pub fn new(base: impl Into<String>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            base: base.into(),
            fetcher,
        }
    }

    async fn check(&self, username: &str) -> Result<CheckStatus, FetchError> {
        let url = profile_url(&self.base, username, &[""])
            .ok_or_else(|| FetchError::Parse(format!("bad profile base {}", self.base)))?;
        let response = self
            .fetcher
            .fetch(HttpRequest::get(url).header("Accept", "text/html"))
            .await?;

        match response.status {
            404 => match classify_profile_html(&response.body) {
                CheckStatus::Unavailable | CheckStatus::Exists => Ok(CheckStatus::NotFound),
                status => Ok(status),
            },
            _ if response.is_success() => Ok(classify_profile_html(&response.body)),
            status => Err(FetchError::from_status(status)),
        }
    }
}

#[async_trait]
impl Checker for HtmlProfileChecker {
    fn name(&self) -> &str {
        "html-profile"
    }

    async fn attempt(&self, username: &str) -> CheckStatus {
        self.check(username).await.unwrap_or_else(|e| {
            debug!("HTML profile check inconclusive for {username}: {e}");
            CheckStatus::Unavailable
        })
    }
}
