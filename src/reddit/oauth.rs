//! OAuth-backed about lookup with client-credentials token issuance.

use super::about::classify_about_response;
use super::checker::{profile_url, Checker};
use super::fetch::{FetchError, Fetcher};
use super::status::CheckStatus;
use super::token::TokenCache;
use crate::transport::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default client-credentials token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Default OAuth API host.
pub const DEFAULT_OAUTH_BASE: &str = "https://oauth.reddit.com";

/// Client credentials for the OAuth path.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(raw))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Looks users up through the OAuth API.
pub struct OAuthChecker {
    credentials: Option<Credentials>,
    tokens: Arc<TokenCache>,
    fetcher: Arc<Fetcher>,
    token_url: String,
    api_base: String,
}

impl OAuthChecker {
    /// Create a checker. Without credentials every attempt is `Unavailable`.
    #[must_use]
    pub fn new(
        credentials: Option<Credentials>,
        tokens: Arc<TokenCache>,
        fetcher: Arc<Fetcher>,
    ) -> Self {
        Self {
            credentials,
            tokens,
            fetcher,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_OAUTH_BASE.to_string(),
        }
    }

    /// Override the token and API endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }

    /// Returns true if credentials are configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Return a bearer token, fetching one if the cache is empty or
    /// `force_refresh` is set.
    async fn access_token(&self, force_refresh: bool) -> Result<String, FetchError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FetchError::Auth("no client credentials configured".to_string()))?;

        if force_refresh {
            self.tokens.invalidate();
        } else if let Some(token) = self.tokens.get() {
            return Ok(token);
        }

        debug!("Requesting reddit OAuth token");
        let request = HttpRequest::post_form(&self.token_url, "grant_type=client_credentials")
            .header("Authorization", credentials.basic_auth());
        let response = self.fetcher.fetch(request).await?;

        if !response.is_success() {
            return Err(FetchError::Auth(format!(
                "token endpoint returned HTTP {}",
                response.status
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Parse(format!("token response: {e}")))?;
        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::Auth("token response without access_token".to_string()))?;
        let expires_in = Duration::from_secs(parsed.expires_in.unwrap_or(0));

        self.tokens.store(access_token.clone(), expires_in);
        info!("Reddit OAuth token refreshed");
        Ok(access_token)
    }

    async fn lookup(&self, username: &str, token: &str) -> Result<HttpResponse, FetchError> {
        let url = profile_url(&self.api_base, username, &["about"])
            .ok_or_else(|| FetchError::Parse(format!("bad OAuth base {}", self.api_base)))?;
        let request = HttpRequest::get(url).header("Authorization", format!("Bearer {token}"));
        self.fetcher.fetch(request).await
    }

    async fn check(&self, username: &str) -> Result<CheckStatus, FetchError> {
        let token = self.access_token(false).await?;
        let mut response = self.lookup(username, &token).await?;

        if response.status == 401 {
            debug!("OAuth token rejected, refreshing once");
            let token = self.access_token(true).await?;
            response = self.lookup(username, &token).await?;
            if response.status == 401 {
                return Err(FetchError::Auth("token rejected after refresh".to_string()));
            }
        }

        classify_about_response(&response, username)
    }
}

#[async_trait]
impl Checker for OAuthChecker {
    fn name(&self) -> &str {
        "oauth"
    }

    async fn attempt(&self, username: &str) -> CheckStatus {
        if self.credentials.is_none() {
            debug!("OAuth credentials missing; oauth check unavailable");
            return CheckStatus::Unavailable;
        }

        match self.check(username).await {
            Ok(status) => status,
            Err(e) => {
                warn!("OAuth check for {username} failed: {e}");
                CheckStatus::Unavailable
            }
        }
    }
}
