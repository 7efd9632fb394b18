//! Bulk Reddit verification and clean-up of stored entries.
//!
//! # Actions
//!
//! ```text
//! single  ── verify one username ───────────────► status
//! bulk    ── oldest `limit` entries ─► verify ──► summary + per-entry results
//! clean   ── confirm ─► bulk ─► pick candidates ─► delete (unless dry run)
//! ```
//!
//! Entries are verified by a fixed pool of workers pulling indices from a
//! shared counter. Results keep input order regardless of completion order.

use crate::entry::{is_valid_username, FieldErrors, MAX_USERNAME_LENGTH};
use crate::reddit::{CheckStatus, CheckStrategy, RedditVerifier};
use crate::store::{EntryStore, StoreError};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Entries scanned when no limit is given.
pub const DEFAULT_LIMIT: usize = 100;

/// Largest accepted scan limit.
pub const MAX_LIMIT: usize = 2000;

/// Concurrent verifications during a scan.
pub const CHECK_CONCURRENCY: usize = 4;

/// Text that must accompany a destructive clean.
pub const CONFIRM_TEXT: &str = "CLEAN";

const CONFIRM_MESSAGE: &str = "Confirmation mismatch. Type CLEAN to execute the clean.";

/// Audit failures.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The request failed validation.
    #[error("invalid audit payload")]
    Invalid(FieldErrors),

    /// A destructive clean was requested without the confirmation text.
    #[error("Confirmation mismatch. Type CLEAN to execute the clean.")]
    ConfirmationRequired,

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuditError {
    /// Field errors to report alongside the message, if any.
    #[must_use]
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors.clone()),
            Self::ConfirmationRequired => Some(FieldErrors::from([(
                "confirmText".to_string(),
                vec![CONFIRM_MESSAGE.to_string()],
            )])),
            Self::Store(_) => None,
        }
    }
}

/// Clamp a requested limit into `1..=MAX_LIMIT`; absent or zero means default.
#[must_use]
pub fn normalize_limit(limit: Option<i64>) -> usize {
    match limit {
        None | Some(0) => DEFAULT_LIMIT,
        Some(n) if n < 1 => 1,
        Some(n) => usize::try_from(n).map_or(MAX_LIMIT, |n| n.min(MAX_LIMIT)),
    }
}

/// Run `worker` over `items` with at most `concurrency` in flight.
///
/// Output order matches input order.
pub async fn map_with_concurrency<'a, T, R, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    worker: F,
) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let next = &next;
    let worker = &worker;
    let runners = (0..concurrency.clamp(1, items.len())).map(move |_| async move {
        let mut done = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(index) else {
                break;
            };
            done.push((index, worker(item).await));
        }
        done
    });

    let mut indexed: Vec<(usize, R)> = join_all(runners).await.into_iter().flatten().collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Audit request, tagged by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuditRequest {
    /// Verify one username.
    Single(SingleRequest),
    /// Verify stored entries.
    Bulk(BulkRequest),
    /// Verify stored entries and delete the bad ones.
    Clean(CleanRequest),
}

/// `single` action parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRequest {
    /// Username to verify.
    pub username: String,
    /// Verification strategy.
    #[serde(default)]
    pub check_strategy: CheckStrategy,
}

/// `bulk` action parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    /// Entries to scan.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Verification strategy.
    #[serde(default)]
    pub check_strategy: CheckStrategy,
}

/// `clean` action parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanRequest {
    /// Entries to scan.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Verification strategy.
    #[serde(default)]
    pub check_strategy: CheckStrategy,
    /// Also delete entries whose check was inconclusive.
    #[serde(default)]
    pub include_unavailable: bool,
    /// Report candidates without deleting.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    /// Must equal [`CONFIRM_TEXT`] when `dry_run` is false.
    #[serde(default)]
    pub confirm_text: Option<String>,
}

const fn default_dry_run() -> bool {
    true
}

impl Default for CleanRequest {
    fn default() -> Self {
        Self {
            limit: None,
            check_strategy: CheckStrategy::default(),
            include_unavailable: false,
            dry_run: true,
            confirm_text: None,
        }
    }
}

/// One verified entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditedEntry {
    /// Entry id.
    pub id: Uuid,
    /// Username as stored.
    pub username_display: String,
    /// Lowercased username.
    pub username_key: String,
    /// Verification outcome.
    pub status: CheckStatus,
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Accounts that exist.
    pub exists: usize,
    /// Accounts that do not exist.
    pub not_found: usize,
    /// Suspended accounts.
    pub suspended: usize,
    /// Inconclusive checks.
    pub unavailable: usize,
}

impl Summary {
    /// Count statuses across `results`.
    #[must_use]
    pub fn from_results(results: &[AuditedEntry]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                CheckStatus::Exists => summary.exists += 1,
                CheckStatus::NotFound => summary.not_found += 1,
                CheckStatus::Suspended => summary.suspended += 1,
                CheckStatus::Unavailable => summary.unavailable += 1,
            }
        }
        summary
    }

    /// Sum of all counts.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.exists + self.not_found + self.suspended + self.unavailable
    }
}

/// `single` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleReport {
    /// Strategy used.
    pub check_strategy: CheckStrategy,
    /// Trimmed username.
    pub username: String,
    /// Verification outcome.
    pub status: CheckStatus,
}

/// `bulk` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    /// Strategy used.
    pub check_strategy: CheckStrategy,
    /// Entries verified.
    pub scanned_count: usize,
    /// Outcome counts.
    pub summary: Summary,
    /// Per-entry outcomes, oldest first.
    pub results: Vec<AuditedEntry>,
}

/// `clean` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    /// Strategy used.
    pub check_strategy: CheckStrategy,
    /// Whether deletion was skipped.
    pub dry_run: bool,
    /// Entries verified.
    pub scanned_count: usize,
    /// Outcome counts.
    pub summary: Summary,
    /// Entries matching a candidate status.
    pub candidate_count: usize,
    /// Entries deleted; absent on a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    /// Statuses treated as deletable.
    pub candidate_statuses: Vec<CheckStatus>,
}

/// Audit result, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuditReport {
    /// `single` result.
    Single(SingleReport),
    /// `bulk` result.
    Bulk(BulkReport),
    /// `clean` result.
    Clean(CleanReport),
}

/// Runs audits against a store.
pub struct Auditor {
    store: Arc<dyn EntryStore>,
    verifier: Arc<RedditVerifier>,
    concurrency: usize,
}

impl Auditor {
    /// Create an auditor with [`CHECK_CONCURRENCY`] workers.
    #[must_use]
    pub fn new(store: Arc<dyn EntryStore>, verifier: Arc<RedditVerifier>) -> Self {
        Self {
            store,
            verifier,
            concurrency: CHECK_CONCURRENCY,
        }
    }

    /// Dispatch a request to its action.
    ///
    /// # Errors
    ///
    /// See [`Self::single`], [`Self::bulk`] and [`Self::clean`].
    pub async fn run(&self, request: AuditRequest) -> Result<AuditReport, AuditError> {
        match request {
            AuditRequest::Single(req) => self.single(&req).await.map(AuditReport::Single),
            AuditRequest::Bulk(req) => self.bulk(&req).await.map(AuditReport::Bulk),
            AuditRequest::Clean(req) => self.clean(&req).await.map(AuditReport::Clean),
        }
    }

    /// Verify one username.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Invalid`] if the username is malformed.
    pub async fn single(&self, request: &SingleRequest) -> Result<SingleReport, AuditError> {
        let username = request.username.trim();
        let message = if username.is_empty() {
            Some("Username is required".to_string())
        } else if username.chars().count() > MAX_USERNAME_LENGTH {
            Some(format!("At most {MAX_USERNAME_LENGTH} characters"))
        } else if !is_valid_username(username) {
            Some("Invalid username format".to_string())
        } else {
            None
        };
        if let Some(message) = message {
            return Err(AuditError::Invalid(FieldErrors::from([(
                "username".to_string(),
                vec![message],
            )])));
        }

        let status = self.verifier.verify(username, request.check_strategy).await;
        Ok(SingleReport {
            check_strategy: request.check_strategy,
            username: username.to_string(),
            status,
        })
    }

    /// Verify the oldest stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Store`] if entries cannot be listed.
    pub async fn bulk(&self, request: &BulkRequest) -> Result<BulkReport, AuditError> {
        let results = self
            .scan(normalize_limit(request.limit), request.check_strategy)
            .await?;
        Ok(BulkReport {
            check_strategy: request.check_strategy,
            scanned_count: results.len(),
            summary: Summary::from_results(&results),
            results,
        })
    }

    /// Verify the oldest stored entries and delete those that failed.
    ///
    /// A destructive run without the confirmation text is rejected before
    /// any verification or deletion happens.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ConfirmationRequired`] or [`AuditError::Store`].
    pub async fn clean(&self, request: &CleanRequest) -> Result<CleanReport, AuditError> {
        if !request.dry_run && request.confirm_text.as_deref() != Some(CONFIRM_TEXT) {
            warn!("Rejected clean without confirmation");
            return Err(AuditError::ConfirmationRequired);
        }

        let results = self
            .scan(normalize_limit(request.limit), request.check_strategy)
            .await?;
        let summary = Summary::from_results(&results);

        let mut candidate_statuses = vec![CheckStatus::NotFound, CheckStatus::Suspended];
        if request.include_unavailable {
            candidate_statuses.push(CheckStatus::Unavailable);
        }
        let candidate_ids: Vec<Uuid> = results
            .iter()
            .filter(|r| candidate_statuses.contains(&r.status))
            .map(|r| r.id)
            .collect();

        let deleted_count = if request.dry_run {
            None
        } else if candidate_ids.is_empty() {
            Some(0)
        } else {
            let deleted = self.store.delete_many(&candidate_ids).await?;
            info!(
                "Clean deleted {deleted} of {} candidate entries",
                candidate_ids.len()
            );
            Some(deleted)
        };

        Ok(CleanReport {
            check_strategy: request.check_strategy,
            dry_run: request.dry_run,
            scanned_count: results.len(),
            summary,
            candidate_count: candidate_ids.len(),
            deleted_count,
            candidate_statuses,
        })
    }

    async fn scan(
        &self,
        limit: usize,
        strategy: CheckStrategy,
    ) -> Result<Vec<AuditedEntry>, AuditError> {
        let entries = self.store.list_oldest(limit).await?;
        info!(
            "Auditing {} entries (limit={limit}, strategy={strategy})",
            entries.len()
        );

        let verifier = &self.verifier;
        let results = map_with_concurrency(&entries, self.concurrency, |entry| async move {
            AuditedEntry {
                id: entry.id,
                username_display: entry.username_display.clone(),
                username_key: entry.username_key.clone(),
                status: verifier.verify(&entry.username_display, strategy).await,
            }
        })
        .await;
        Ok(results)
    }
}
