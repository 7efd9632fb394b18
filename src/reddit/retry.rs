//! Retry policy for network-level failures.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default number of extra attempts after the first.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default linear backoff step.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(250);

/// Linear-backoff retry policy.
///
/// An operation is attempted up to `retries + 1` times. After failed attempt
/// `n` (1-based) the policy sleeps `backoff_step * n` before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub retries: u32,
    /// Backoff step multiplied by the attempt number.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(retries: u32, backoff_step: Duration) -> Self {
        Self {
            retries,
            backoff_step,
        }
    }

    /// Total number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Every `Err` is treated as
    /// retryable; callers only return `Err` for network-level failures.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max = self.max_attempts();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max => {
                    let delay = self.backoff(attempt);
                    debug!("Attempt {attempt}/{max} failed: {e}; retrying in {delay:?}");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
