//! Caller-side retry policy for transient concurrency failures.
//!
//! The core never retries on its own: a unit of work that cannot be serialized is rolled back and
//! reported as [`Error::TransactionConflict`]. Request handlers wrap each core call in
//! [`RetryPolicy::run`], which re-runs the call a bounded number of times and cancels any attempt
//! that exceeds its time budget. Business-rule failures are returned immediately.

use crate::errors::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with a per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wall-clock budget for one attempt; an attempt that overruns is dropped and rolled back
    pub attempt_timeout: Duration,
    /// Pause before the next attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    /// One retry after the first attempt.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(5),
            backoff: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            attempt_timeout,
            backoff: Duration::ZERO,
        }
    }

    /// Runs `operation`, retrying only on [`Error::is_retryable`] failures and timeouts.
    ///
    /// Each call to `operation` must start a fresh unit of work. A timed-out attempt is dropped,
    /// but its commit may already have reached the store; a retry then sees the effect of the
    /// first attempt. Operations whose retry would misreport that case (a create answering
    /// `DuplicateTxid`, a removal answering `EntryNotFound`) should use
    /// [`RetryPolicy::run_with_recovery`].
    pub async fn run<T, F, Fut>(&self, operation: &str, attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with_recovery(operation, attempt_fn, || std::future::ready(Ok(None)))
            .await
    }

    /// Like [`RetryPolicy::run`], but consults `recover_fn` after every timed-out attempt.
    ///
    /// `recover_fn` reads the store and returns `Some(value)` when the dropped attempt did
    /// commit, in which case that value is returned without another attempt. `None` means the
    /// attempt left no trace and the normal retry rules apply.
    pub async fn run_with_recovery<T, F, Fut, R, RFut>(
        &self,
        operation: &str,
        mut attempt_fn: F,
        mut recover_fn: R,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = Result<Option<T>>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match tokio::time::timeout(self.attempt_timeout, attempt_fn()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if !e.is_retryable() => return Err(e),
                Ok(Err(e)) => e,
                Err(_) => {
                    if let Some(value) = recover_fn().await? {
                        warn!(operation, attempt, "Timed-out attempt had already committed");
                        return Ok(value);
                    }
                    Error::TransactionConflict {
                        reason: format!(
                            "attempt timed out after {} ms",
                            self.attempt_timeout.as_millis()
                        ),
                    }
                }
            };

            if attempt >= max_attempts {
                return Err(error);
            }

            warn!(operation, attempt, max_attempts, %error, "Retrying after transient failure");
            attempt += 1;
            tokio::time::sleep(self.backoff).await;
        }
    }
}
