//! Retry policy for operations against remote sources.
//!
//! Only [`ArcaError::SourceUnreachable`] is retried. Everything else (a missing
//! version, a bad path, an unwritable cache) cannot improve on a second try.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use crate::core::{ArcaError, classify};
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Delay iterator yielding at most `attempts` retries.
pub fn retry_strategy(attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
        .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
        .map(jitter)
        .take(attempts)
}

/// Whether an error is worth another attempt.
#[must_use]
pub fn is_retryable(error: &anyhow::Error) -> bool {
    classify(error).is_some_and(ArcaError::is_retryable)
}

/// Runs `action`, retrying up to `attempts` extra times while it fails with
/// an unreachable source.
pub async fn retry_unreachable<A, F, T>(attempts: usize, action: A) -> Result<T>
where
    A: FnMut() -> F,
    F: Future<Output = Result<T>>,
{
    RetryIf::spawn(retry_strategy(attempts), action, |e: &anyhow::Error| {
        let retry = is_retryable(e);
        if retry {
            tracing::debug!("Retrying after transient failure: {e}");
        }
        retry
    })
    .await
}
