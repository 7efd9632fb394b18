//! Reddit identity verifier: strategy selection over the checker chains.

use super::about::{AboutJsonChecker, MirrorEndpoint};
use super::checker::{run_chain, Checker};
use super::fetch::Fetcher;
use super::oauth::{Credentials, OAuthChecker, DEFAULT_OAUTH_BASE, DEFAULT_TOKEN_URL};
use super::profile::HtmlProfileChecker;
use super::retry::RetryPolicy;
use super::status::{CheckStatus, CheckStrategy};
use super::token::{TokenCache, TokenCacheStats};
use crate::config::RedditConfig;
use crate::error::Result;
use crate::transport::{HttpTransport, ReqwestTransport};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the verifier.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// User-Agent sent on every request.
    pub user_agent: String,
    /// Per-attempt timeout.
    pub request_timeout: Duration,
    /// Retry policy for network failures.
    pub retry: RetryPolicy,
    /// OAuth client credentials; `None` disables the OAuth path.
    pub credentials: Option<Credentials>,
    /// Public JSON mirrors, in trial order.
    pub mirrors: Vec<MirrorEndpoint>,
    /// Host for the HTML profile fallback.
    pub html_base: String,
    /// Client-credentials token endpoint.
    pub token_url: String,
    /// OAuth API host.
    pub oauth_base: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            user_agent: "LeaderboardHolder/1.0".to_string(),
            request_timeout: Duration::from_secs(6),
            retry: RetryPolicy::default(),
            credentials: None,
            mirrors: MirrorEndpoint::defaults(),
            html_base: HtmlProfileChecker::DEFAULT_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
        }
    }
}

impl From<&RedditConfig> for VerifierConfig {
    fn from(config: &RedditConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout(),
            retry: RetryPolicy::new(config.retries, Duration::from_millis(config.backoff_ms)),
            credentials: config
                .credentials()
                .map(|(id, secret)| Credentials::new(id, secret)),
            ..Self::default()
        }
    }
}

/// Verification counters.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierStats {
    /// Total `verify` calls.
    pub checks: u64,
    /// Calls that ran the OAuth checker.
    pub oauth_checks: u64,
    /// Calls that ran the public chain.
    pub public_checks: u64,
    /// Results by status.
    pub exists: u64,
    /// Results by status.
    pub not_found: u64,
    /// Results by status.
    pub suspended: u64,
    /// Results by status.
    pub unavailable: u64,
}

impl VerifierStats {
    fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Exists => self.exists += 1,
            CheckStatus::NotFound => self.not_found += 1,
            CheckStatus::Suspended => self.suspended += 1,
            CheckStatus::Unavailable => self.unavailable += 1,
        }
    }
}

/// Classifies Reddit usernames.
///
/// Combines:
/// 1. An OAuth checker backed by a cached client-credentials token
/// 2. A public chain of JSON mirrors followed by the HTML profile page
pub struct RedditVerifier {
    oauth: OAuthChecker,
    public_chain: Vec<Box<dyn Checker>>,
    fetcher: Arc<Fetcher>,
    tokens: Arc<TokenCache>,
    stats: RwLock<VerifierStats>,
}

impl RedditVerifier {
    /// Create a verifier over `transport`, sharing `tokens` with its OAuth checker.
    #[must_use]
    pub fn new(
        config: VerifierConfig,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        let fetcher = Arc::new(Fetcher::new(
            transport,
            config.retry,
            config.request_timeout,
            config.user_agent,
        ));

        let oauth = OAuthChecker::new(config.credentials, Arc::clone(&tokens), Arc::clone(&fetcher))
            .with_endpoints(config.token_url, config.oauth_base);

        let mut public_chain: Vec<Box<dyn Checker>> = config
            .mirrors
            .into_iter()
            .map(|m| Box::new(AboutJsonChecker::new(m, Arc::clone(&fetcher))) as Box<dyn Checker>)
            .collect();
        public_chain.push(Box::new(HtmlProfileChecker::new(
            config.html_base,
            Arc::clone(&fetcher),
        )));

        info!(
            "Reddit verifier initialized (oauth_enabled={}, public_steps={})",
            oauth.is_enabled(),
            public_chain.len()
        );

        Self {
            oauth,
            public_chain,
            fetcher,
            tokens,
            stats: RwLock::new(VerifierStats::default()),
        }
    }

    /// Build a production verifier from application config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &RedditConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(
            VerifierConfig::from(config),
            Arc::new(transport),
            Arc::new(TokenCache::with_system_clock()),
        ))
    }

    /// Classify `username` using `strategy`. Never fails.
    pub async fn verify(&self, username: &str, strategy: CheckStrategy) -> CheckStatus {
        debug!("Verifying reddit user {username} (strategy={strategy})");

        let status = match strategy {
            CheckStrategy::Oauth => self.verify_oauth(username).await,
            CheckStrategy::Public => self.verify_public(username).await,
            CheckStrategy::Auto => {
                if self.oauth.is_enabled() {
                    match self.verify_oauth(username).await {
                        CheckStatus::Unavailable => {
                            debug!("OAuth unavailable for {username}, falling back to public");
                            self.verify_public(username).await
                        }
                        status => status,
                    }
                } else {
                    self.verify_public(username).await
                }
            }
        };

        {
            let mut stats = self.stats.write();
            stats.checks += 1;
            stats.record(status);
        }

        debug!("Reddit user {username} classified as {status}");
        status
    }

    async fn verify_oauth(&self, username: &str) -> CheckStatus {
        self.stats.write().oauth_checks += 1;
        self.oauth.attempt(username).await
    }

    async fn verify_public(&self, username: &str) -> CheckStatus {
        self.stats.write().public_checks += 1;
        run_chain(&self.public_chain, username).await
    }

    /// Strategy used for submissions: `auto` with credentials, else `public`.
    #[must_use]
    pub fn submission_strategy(&self) -> CheckStrategy {
        if self.oauth.is_enabled() {
            CheckStrategy::Auto
        } else {
            CheckStrategy::Public
        }
    }

    /// Returns true if OAuth credentials are configured.
    #[must_use]
    pub fn oauth_enabled(&self) -> bool {
        self.oauth.is_enabled()
    }

    /// Verification counters.
    #[must_use]
    pub fn stats(&self) -> VerifierStats {
        self.stats.read().clone()
    }

    /// Token cache counters.
    #[must_use]
    pub fn token_stats(&self) -> TokenCacheStats {
        self.tokens.stats()
    }

    /// Network attempts made across all checkers.
    #[must_use]
    pub fn network_attempts(&self) -> u64 {
        self.fetcher.attempts()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::nullable::{NullClock, NullTransport};
    use crate::reddit::token::Clock;
    use crate::transport::TransportError;

    const TOKEN_OK: &str = r#"{"access_token":"tok","expires_in":3600}"#;

    struct Fixture {
        transport: Arc<NullTransport>,
        clock: Arc<NullClock>,
        verifier: RedditVerifier,
    }

    fn fixture(credentials: Option<Credentials>) -> Fixture {
        let transport = Arc::new(NullTransport::new());
        let clock = Arc::new(NullClock::new());
        let tokens = Arc::new(TokenCache::new(Arc::clone(&clock) as Arc<dyn Clock>));
        let config = VerifierConfig {
            retry: RetryPolicy::new(2, Duration::ZERO),
            credentials,
            ..VerifierConfig::default()
        };
        let verifier = RedditVerifier::new(
            config,
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            tokens,
        );
        Fixture {
            transport,
            clock,
            verifier,
        }
    }

    fn creds() -> Option<Credentials> {
        Some(Credentials::new("id", "secret"))
    }

    #[tokio::test]
    async fn test_public_exists_on_first_mirror() {
        let f = fixture(None);
        f.transport.respond(
            "www.reddit.com/user/spez/about.json",
            200,
            r#"{"data":{"name":"spez"}}"#,
        );

        let status = f.verifier.verify("spez", CheckStrategy::Public).await;

        assert_eq!(status, CheckStatus::Exists);
        assert_eq!(f.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_public_all_404_is_not_found() {
        let f = fixture(None);
        // Every endpoint is unscripted and answers 404.
        let status = f
            .verifier
            .verify("totally_invalid_zzz", CheckStrategy::Public)
            .await;

        assert_eq!(status, CheckStatus::NotFound);
        // Three mirrors plus the HTML page, one attempt each.
        assert_eq!(f.transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_public_one_network_error_is_unavailable() {
        let f = fixture(None);
        f.transport.fail("api.reddit.com", TransportError::Connect("reset".into()));

        let status = f.verifier.verify("ghost", CheckStrategy::Public).await;

        assert_eq!(status, CheckStatus::Unavailable);
        assert_eq!(f.transport.request_count("api.reddit.com"), 3);
    }

    #[tokio::test]
    async fn test_public_rate_limit_then_exists() {
        let f = fixture(None);
        f.transport.respond("www.reddit.com/user/spez/about.json", 429, "");
        f.transport.respond(
            "api.reddit.com/user/spez/about",
            200,
            r#"{"data":{"name":"spez"}}"#,
        );

        let status = f.verifier.verify("spez", CheckStrategy::Public).await;
        assert_eq!(status, CheckStatus::Exists);
        assert_eq!(f.transport.request_count("old.reddit.com"), 0);
    }

    #[tokio::test]
    async fn test_public_suspended_short_circuits() {
        let f = fixture(None);
        f.transport.respond(
            "www.reddit.com/user/banned/about.json",
            200,
            r#"{"data":{"name":"not_banned","is_suspended":true}}"#,
        );

        let status = f.verifier.verify("banned", CheckStrategy::Public).await;
        assert_eq!(status, CheckStatus::Suspended);
        assert_eq!(f.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_public_html_fallback_decides() {
        let f = fixture(None);
        for mirror in ["www.reddit.com", "api.reddit.com", "old.reddit.com"] {
            f.transport.respond(&format!("{mirror}/user/spez/about"), 503, "");
        }
        f.transport.respond(
            "www.reddit.com/user/spez/",
            200,
            "<shreddit-profile></shreddit-profile>",
        );

        let status = f.verifier.verify("spez", CheckStrategy::Public).await;
        assert_eq!(status, CheckStatus::Exists);
    }

    #[tokio::test]
    async fn test_oauth_without_credentials_makes_no_calls() {
        let f = fixture(None);
        let status = f.verifier.verify("spez", CheckStrategy::Oauth).await;

        assert_eq!(status, CheckStatus::Unavailable);
        assert!(f.transport.requests().is_empty());
        assert_eq!(f.verifier.network_attempts(), 0);
    }

    #[tokio::test]
    async fn test_auto_oauth_exists_skips_public() {
        let f = fixture(creds());
        f.transport.respond("access_token", 200, TOKEN_OK);
        f.transport
            .respond("oauth.reddit.com/user/spez/about", 200, r#"{"data":{"name":"spez"}}"#);

        let status = f.verifier.verify("spez", CheckStrategy::Auto).await;

        assert_eq!(status, CheckStatus::Exists);
        assert_eq!(f.transport.request_count("www.reddit.com/user"), 0);
        assert_eq!(f.transport.request_count("api.reddit.com"), 0);
        assert_eq!(f.verifier.stats().public_checks, 0);
    }

    #[tokio::test]
    async fn test_auto_oauth_not_found_skips_public() {
        let f = fixture(creds());
        f.transport.respond("access_token", 200, TOKEN_OK);
        f.transport.respond("oauth.reddit.com/user/ghost/about", 404, "");

        let status = f.verifier.verify("ghost", CheckStrategy::Auto).await;
        assert_eq!(status, CheckStatus::NotFound);
        assert_eq!(f.verifier.stats().public_checks, 0);
    }

    #[tokio::test]
    async fn test_auto_falls_back_when_oauth_unavailable() {
        let f = fixture(creds());
        f.transport.respond("access_token", 500, "");
        f.transport.respond(
            "www.reddit.com/user/spez/about.json",
            200,
            r#"{"data":{"name":"spez"}}"#,
        );

        let status = f.verifier.verify("spez", CheckStrategy::Auto).await;

        assert_eq!(status, CheckStatus::Exists);
        let stats = f.verifier.stats();
        assert_eq!(stats.oauth_checks, 1);
        assert_eq!(stats.public_checks, 1);
    }

    #[tokio::test]
    async fn test_auto_without_credentials_is_public() {
        let f = fixture(None);
        f.transport.respond(
            "www.reddit.com/user/spez/about.json",
            200,
            r#"{"data":{"name":"spez"}}"#,
        );

        let status = f.verifier.verify("spez", CheckStrategy::Auto).await;
        assert_eq!(status, CheckStatus::Exists);
        assert_eq!(f.verifier.stats().oauth_checks, 0);
    }

    #[tokio::test]
    async fn test_token_fetched_once_within_window() {
        let f = fixture(creds());
        f.transport.respond("access_token", 200, TOKEN_OK);
        f.transport.respond("oauth.reddit.com/user/", 200, r#"{"data":{"name":"a"}}"#);

        f.verifier.verify("a", CheckStrategy::Oauth).await;
        f.verifier.verify("a", CheckStrategy::Oauth).await;
        assert_eq!(f.transport.request_count("access_token"), 1);

        f.clock.advance(Duration::from_secs(3600));
        f.verifier.verify("a", CheckStrategy::Oauth).await;
        assert_eq!(f.transport.request_count("access_token"), 2);
        assert_eq!(f.verifier.token_stats().stores, 2);
    }

    #[tokio::test]
    async fn test_stats_by_status() {
        let f = fixture(None);
        f.verifier.verify("ghost", CheckStrategy::Public).await;
        f.verifier.verify("ghost", CheckStrategy::Oauth).await;

        let stats = f.verifier.stats();
        assert_eq!(stats.checks, 2);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.unavailable, 1);
    }

    #[test]
    fn test_config_from_app_config() {
        let reddit = RedditConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            retries: 1,
            backoff_ms: 100,
            ..RedditConfig::default()
        };
        let config = VerifierConfig::from(&reddit);

        assert_eq!(config.credentials, Some(Credentials::new("id", "secret")));
        assert_eq!(config.retry.max_attempts(), 2);
        assert_eq!(config.retry.backoff(2), Duration::from_millis(200));
        assert_eq!(config.mirrors.len(), 3);
    }
}
