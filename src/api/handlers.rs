//! Route handlers.

use super::error::ApiError;
use super::{AppState, USERNAME_TAKEN};
use crate::audit::{AuditReport, AuditRequest};
use crate::config::CheckMode;
use crate::entry::{is_valid_username, normalize_username, EntryInput, HoldingEntry};
use crate::leaderboard::{
    build_leaderboard, build_top_losers, find_my_rank, LeaderboardStats, MyRank, RankedEntry,
    TopLoserEntry,
};
use crate::market::MarketPriceSnapshot;
use crate::reddit::{CheckStatus, VerifierStats};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_JSON: &str = "Invalid JSON payload.";
const ACCOUNT_NOT_FOUND: &str = "Reddit account not found.";
const ACCOUNT_SUSPENDED: &str = "Reddit account is suspended.";
const VERIFICATION_UNAVAILABLE: &str =
    "Could not verify the Reddit account. Please try again shortly.";

/// `POST /api/entry` success body.
#[derive(Debug, Serialize)]
pub struct PostEntryResponse {
    /// The stored entry.
    pub entry: HoldingEntry,
    /// Its position after re-ranking.
    pub rank: usize,
}

/// `GET /api/leaderboard` query.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Username to locate on the board.
    pub username: Option<String>,
}

/// `GET /api/leaderboard` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    /// Aggregates.
    pub stats: LeaderboardStats,
    /// Visible top entries.
    pub top10: Vec<RankedEntry>,
    /// Biggest losers against the market price.
    pub top10_losers: Vec<TopLoserEntry>,
    /// Entries beyond the visible top.
    pub hidden_count: usize,
    /// Market price used for the losers list.
    pub market: MarketPriceSnapshot,
    /// The requested user's position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rank: Option<MyRank>,
}

/// `GET /health` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether OAuth credentials are configured.
    pub oauth_enabled: bool,
    /// Verification counters since start.
    pub verifier: VerifierStats,
}

fn parse_json(body: &[u8]) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request(INVALID_JSON))
}

/// Submit a holding.
///
/// # Errors
///
/// 400 on malformed or invalid input and rejected accounts, 409 on a taken
/// username, 503 when the account cannot be verified in strict mode.
pub async fn post_entry(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<PostEntryResponse>), ApiError> {
    let input: EntryInput = serde_json::from_value(parse_json(&body)?)
        .map_err(|e| ApiError::bad_request(format!("Invalid payload: {e}")))?;
    let valid = input.validate().map_err(ApiError::validation)?;
    let username = &valid.username;

    if state.store.find_by_key(&username.key).await?.is_some() {
        return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
    }

    let strategy = state.verifier.submission_strategy();
    match state.verifier.verify(&username.display, strategy).await {
        CheckStatus::Exists => {}
        CheckStatus::NotFound => return Err(ApiError::field("username", ACCOUNT_NOT_FOUND)),
        CheckStatus::Suspended => return Err(ApiError::field("username", ACCOUNT_SUSPENDED)),
        CheckStatus::Unavailable => match state.config.reddit.check_mode {
            CheckMode::Soft => {
                warn!(
                    "Reddit verification unavailable for {}, accepting in soft mode",
                    username.display
                );
            }
            CheckMode::Strict => {
                return Err(ApiError::Unavailable(VERIFICATION_UNAVAILABLE.to_string()));
            }
        },
    }

    valid.check_nominal().map_err(ApiError::validation)?;

    let saved = state.store.create(HoldingEntry::new(&valid)).await?;
    info!(
        "Stored entry for {} ({} lots at {})",
        saved.username_display, saved.lots, saved.avg_price
    );

    let entries = state.store.list().await?;
    let board = build_leaderboard(&entries);
    let rank = board
        .ranked
        .iter()
        .find(|r| r.entry.id == saved.id)
        .map(|r| r.rank)
        .ok_or_else(|| ApiError::Internal(format!("entry {} missing after insert", saved.id)))?;

    Ok((
        StatusCode::CREATED,
        Json(PostEntryResponse { entry: saved, rank }),
    ))
}

/// Current board, losers and optional personal rank.
///
/// # Errors
///
/// 400 on a malformed username.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let username_key = match query.username.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let normalized = normalize_username(raw);
            if !is_valid_username(&normalized.display) {
                return Err(ApiError::bad_request("Invalid username format."));
            }
            Some(normalized.key)
        }
        _ => None,
    };

    let entries = state.store.list().await?;
    let board = build_leaderboard(&entries);
    let market = state.market.snapshot().await;
    let top10_losers = market
        .price
        .map(|price| build_top_losers(&board.ranked, price))
        .unwrap_or_default();
    let my_rank = username_key.and_then(|key| find_my_rank(&board.ranked, &key));

    Ok(Json(LeaderboardResponse {
        stats: board.stats,
        top10: board.top,
        top10_losers,
        hidden_count: board.hidden_count,
        market,
        my_rank,
    }))
}

/// Development-only Reddit audit.
///
/// # Errors
///
/// 404 outside dev mode, 400 on malformed payloads or a missing clean
/// confirmation.
pub async fn post_reddit_audit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AuditReport>, ApiError> {
    if !state.config.dev_mode {
        return Err(ApiError::NotFound);
    }

    let request: AuditRequest = serde_json::from_value(parse_json(&body)?)
        .map_err(|e| ApiError::bad_request(format!("Invalid payload: {e}")))?;
    Ok(Json(state.auditor.run(request).await?))
}

/// Liveness and verifier counters.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        oauth_enabled: state.verifier.oauth_enabled(),
        verifier: state.verifier.stats(),
    })
}
