//! Single-slot OAuth bearer token cache.
//!
//! The cache is owned by the verifier and shared with its OAuth checker.
//! Time comes from an injected [`Clock`] so expiry can be tested without
//! sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Safety margin subtracted from the issuer's expiry.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lower bound on how long a fetched token is kept.
pub const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(60);

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cached bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    /// Bearer token value.
    pub access_token: String,
    /// Instant after which the token is no longer used.
    pub expires_at: Instant,
}

/// Token cache statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenCacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that found no valid token.
    pub misses: u64,
    /// Tokens stored.
    pub stores: u64,
}

/// Single-slot token cache. Last write wins.
pub struct TokenCache {
    slot: Mutex<Option<OAuthToken>>,
    stats: Mutex<TokenCacheStats>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache using `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            stats: Mutex::new(TokenCacheStats::default()),
            clock,
        }
    }

    /// Create an empty cache on the system clock.
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Lifetime granted to a token the issuer says lives `expires_in`.
    #[must_use]
    pub fn lifetime_for(expires_in: Duration) -> Duration {
        expires_in
            .saturating_sub(EXPIRY_MARGIN)
            .max(MIN_TOKEN_LIFETIME)
    }

    /// Return the cached token if it has not expired.
    pub fn get(&self) -> Option<String> {
        let now = self.clock.now();
        let token = self
            .slot
            .lock()
            .as_ref()
            .filter(|t| now < t.expires_at)
            .map(|t| t.access_token.clone());

        let mut stats = self.stats.lock();
        if token.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        token
    }

    /// Store a freshly issued token.
    pub fn store(&self, access_token: String, expires_in: Duration) -> OAuthToken {
        let token = OAuthToken {
            access_token,
            expires_at: self.clock.now() + Self::lifetime_for(expires_in),
        };
        *self.slot.lock() = Some(token.clone());
        self.stats.lock().stores += 1;
        token
    }

    /// Drop the cached token.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    /// Current cache statistics.
    #[must_use]
    pub fn stats(&self) -> TokenCacheStats {
        *self.stats.lock()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::with_system_clock()
    }
}
