//! The checker abstraction and chain aggregation.

use super::status::CheckStatus;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// One way of classifying a username.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Classify `username`. Never fails; problems become `Unavailable`.
    async fn attempt(&self, username: &str) -> CheckStatus;
}

/// Run `checkers` in order and aggregate their answers.
///
/// `Exists` and `Suspended` return immediately. Otherwise the chain yields
/// `NotFound` only if some checker reported not-found and none reported
/// unavailable; anything else is `Unavailable`.
pub async fn run_chain(checkers: &[Box<dyn Checker>], username: &str) -> CheckStatus {
    let mut saw_not_found = false;
    let mut saw_unavailable = false;

    for checker in checkers {
        let status = checker.attempt(username).await;
        debug!("{} classified {username} as {status}", checker.name());
        match status {
            CheckStatus::Exists | CheckStatus::Suspended => return status,
            CheckStatus::NotFound => saw_not_found = true,
            CheckStatus::Unavailable => saw_unavailable = true,
        }
    }

    if saw_not_found && !saw_unavailable {
        CheckStatus::NotFound
    } else {
        CheckStatus::Unavailable
    }
}

/// Build `{base}/user/{username}/{tail...}` with proper percent-encoding.
///
/// An empty trailing segment yields a trailing slash.
pub(crate) fn profile_url(base: &str, username: &str, tail: &[&str]) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty().push("user").push(username);
        for segment in tail {
            segments.push(segment);
        }
    }
    Some(url.into())
}
