//! Retry with exponential backoff for transient geocoding failures.
//!
//! Only errors for which [`GeocodeError::is_transient`] holds are retried
//! (timeouts, connection failures, HTTP 429, HTTP 5xx). Everything else,
//! including "no match", returns immediately.

use std::future::Future;
use std::time::Duration;

use crate::GeocodeError;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries at 2s, 4s, 8s.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the retry
/// budget is spent. `operation` is called once per attempt to build a
/// fresh future.
///
/// # Errors
///
/// Returns the last error from `operation`.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, GeocodeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                log::warn!(
                    "[{label}] transient error: {e}; retry {retry}/{} in {delay:?}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_transient() {
                    log::warn!("[{label}] giving up after {} retries: {e}", policy.max_retries);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    const FAST: RetryPolicy = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::ZERO,
    };

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&FAST, "test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(GeocodeError::RateLimited)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&FAST, "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(GeocodeError::Status { status: 503 }) }
        })
        .await;

        assert!(matches!(result, Err(GeocodeError::Status { status: 503 })));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&FAST, "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(GeocodeError::Status { status: 404 }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
