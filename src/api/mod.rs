//! HTTP API.
//!
//! | Route                       | Handler                         |
//! |-----------------------------|---------------------------------|
//! | `POST /api/entry`           | [`handlers::post_entry`]        |
//! | `GET /api/leaderboard`      | [`handlers::get_leaderboard`]   |
//! | `POST /api/dev/reddit-audit`| [`handlers::post_reddit_audit`] |
//! | `GET /health`               | [`handlers::health`]            |
//!
//! The audit route answers 404 unless `dev_mode` is enabled.

mod error;
mod handlers;

pub use error::{ApiError, VALIDATION_FAILED};
pub use handlers::{
    get_leaderboard, health, post_entry, post_reddit_audit, HealthResponse, LeaderboardQuery,
    LeaderboardResponse, PostEntryResponse,
};

use crate::audit::Auditor;
use crate::config::AppConfig;
use crate::market::MarketClient;
use crate::reddit::RedditVerifier;
use crate::store::EntryStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Conflict message for a taken username.
pub const USERNAME_TAKEN: &str = "Username is already taken, pick another one.";

/// Shared handler state.
pub struct AppState {
    /// Application configuration.
    pub config: AppConfig,
    /// Entry storage.
    pub store: Arc<dyn EntryStore>,
    /// Reddit identity verifier.
    pub verifier: Arc<RedditVerifier>,
    /// Market snapshot source.
    pub market: Arc<MarketClient>,
    /// Bulk verification over the store.
    pub auditor: Auditor,
}

impl AppState {
    /// Wire up state from its parts.
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn EntryStore>,
        verifier: Arc<RedditVerifier>,
        market: Arc<MarketClient>,
    ) -> Self {
        let auditor = Auditor::new(Arc::clone(&store), Arc::clone(&verifier));
        Self {
            config,
            store,
            verifier,
            market,
            auditor,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/entry", post(post_entry))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/dev/reddit-audit", post(post_reddit_audit))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
