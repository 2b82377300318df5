//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::error::AppError;

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted.
///
/// The backoff sleep is interrupted by cancellation, in which case
/// `AppError::Cancelled` is returned.
///
/// # Arguments
///
/// * `policy` - Attempt limit and backoff schedule
/// * `cancel_token` - Aborts waiting between attempts
/// * `operation` - Short label used in log lines
/// * `op` - Produces a fresh future per attempt
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    cancel_token: &CancellationToken,
    operation: &str,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel_token.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient failure"
                );
                if !sleep_or_cancel(delay, cancel_token).await {
                    return Err(AppError::Cancelled);
                }
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::warn!(operation, attempt, error = %e, "Giving up after retries");
                }
                return Err(e);
            }
        }
    }
}

/// Sleeps for `delay` unless the token fires first.
///
/// Returns `false` if cancelled.
pub async fn sleep_or_cancel(delay: Duration, cancel_token: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel_token.is_cancelled();
    }
    tokio::select! {
        _ = cancel_token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
