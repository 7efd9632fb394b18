//! Reddit identity verification.
//!
//! Decides whether a username denotes a real, non-suspended Reddit account
//! while tolerating upstream flakiness. Every failure is folded into
//! [`CheckStatus::Unavailable`]; nothing here returns an error to callers.
//!
//! # Architecture
//!
//! ```text
//! verify(username, strategy)
//!        │
//!        ├── oauth ──────► OAuth about ──► result
//!        │
//!        ├── auto ───────► OAuth about
//!        │                   │
//!        │          ┌────────┴────────┐
//!        │     UNAVAILABLE        conclusive / not_found
//!        │          │                 │
//!        │          ▼                 ▼
//!        └── public ► www about.json  return
//!                       │
//!                     api about
//!                       │
//!                     old about.json
//!                       │
//!                     HTML profile page
//! ```
//!
//! Each HTTP call runs through a [`Fetcher`]: per-attempt timeout, linear
//! backoff retry on network failures, fixed User-Agent. OAuth bearer tokens
//! live in a [`TokenCache`] owned by the verifier.

mod about;
mod checker;
mod fetch;
mod oauth;
mod profile;
mod retry;
mod status;
mod token;
mod verifier;

pub use about::{classify_about_body, AboutJsonChecker, MirrorEndpoint};
pub use checker::{run_chain, Checker};
pub use fetch::{FetchError, Fetcher};
pub use oauth::{Credentials, OAuthChecker};
pub use profile::{classify_profile_html, HtmlProfileChecker};
pub use retry::RetryPolicy;
pub use status::{CheckStatus, CheckStrategy};
pub use token::{Clock, OAuthToken, SystemClock, TokenCache, TokenCacheStats};
pub use verifier::{RedditVerifier, VerifierConfig, VerifierStats};
