//! Thin convenience wrappers over [`Throttle::check`], peripheral to the
//! core decision engine. Ported in spirit (not in code shape) from the
//! original implementation's decorator module.

use std::future::Future;
use std::time::Duration;

use crate::error::{RateLimitError, Result};
use crate::limiter::Limiter;
use crate::throttle::Throttle;

/// Run `f` if `key` fits the quota, otherwise fail with
/// [`RateLimitError::RateLimitExceeded`].
///
/// `qty` is fixed at 1 per invocation, matching the original decorator's
/// per-call accounting.
pub async fn throttle_fn<L, F, Fut, T>(throttle: &Throttle<L>, key: &str, f: F) -> Result<T>
where
    L: Limiter,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let result = throttle.check(key, 1).await?;
    if result.limited {
        return Err(RateLimitError::RateLimitExceeded {
            retry_after: result.retry_after,
            remaining: result.remaining,
            limit: result.limit,
        });
    }
    Ok(f().await)
}

/// Like [`throttle_fn`], but on rejection sleeps for `retry_after` and
/// retries instead of failing, up to `max_attempts` times. A naive
/// sleep-and-retry loop, matching the original's async retry helper.
///
/// # Panics
///
/// Panics if `max_attempts` is zero — there is no attempt budget to spend.
pub async fn sleep_and_retry<L, F, Fut, T>(
    throttle: &Throttle<L>,
    key: &str,
    max_attempts: u32,
    mut f: F,
) -> Result<T>
where
    L: Limiter,
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    assert!(max_attempts >= 1, "max_attempts must be at least 1");

    for attempt in 0..max_attempts {
        let result = throttle.check(key, 1).await?;
        if !result.limited {
            return Ok(f().await);
        }
        if attempt + 1 == max_attempts {
            return Err(RateLimitError::RateLimitExceeded {
                retry_after: result.retry_after,
                remaining: result.remaining,
                limit: result.limit,
            });
        }
        tokio::time::sleep(result.retry_after.unwrap_or(Duration::from_millis(10))).await;
    }
    unreachable!("max_attempts must be at least 1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::PeriodicLimiter;
    use crate::quota::Quota;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_throttle_fn_runs_when_admitted() {
        let throttle = Throttle::new(
            Quota::per_minute(5, 0),
            PeriodicLimiter::new(MemoryStore::new()),
        );
        let result = throttle_fn(&throttle, "k", || async { 42 }).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_throttle_fn_fails_when_exhausted() {
        let throttle = Throttle::new(
            Quota::per_minute(1, 0),
            PeriodicLimiter::new(MemoryStore::new()),
        );
        throttle_fn(&throttle, "k", || async {}).await.unwrap();
        let err = throttle_fn(&throttle, "k", || async {}).await.unwrap_err();
        assert!(matches!(err, RateLimitError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    #[should_panic(expected = "max_attempts must be at least 1")]
    async fn test_sleep_and_retry_rejects_zero_attempts() {
        let throttle = Throttle::new(
            Quota::per_minute(5, 0),
            PeriodicLimiter::new(MemoryStore::new()),
        );
        let _ = sleep_and_retry(&throttle, "k", 0, || async {}).await;
    }
}
