//! Fixed-window rate limiting.

use std::time::Duration;

use chrono::Utc;

use crate::error::Result;
use crate::limit_data::LimitData;
use crate::limiter::Limiter;
use crate::quota::Quota;
use crate::result::RateLimitResult;
use crate::storage::Store;

/// Fixed-window limiter: each key has a window starting at `created_at`
/// and lasting `quota.period()`. `used`/`remaining` reset to zero/`limit`
/// when the window rolls over.
pub struct PeriodicLimiter<S> {
    store: S,
}

impl<S: Store> PeriodicLimiter<S> {
    /// Build a limiter over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `period - elapsed`, mapped through this crate's `None` sentinel for
    /// "not meaningfully defined" whenever the result is zero or negative —
    /// which happens once `elapsed` has run past the window it measures.
    fn reset_after(period: chrono::Duration, elapsed: chrono::Duration) -> Option<Duration> {
        let remaining = period - elapsed;
        if remaining > chrono::Duration::zero() {
            Some(remaining.to_std().unwrap_or(Duration::ZERO))
        } else {
            None
        }
    }
}

impl<S: Store> Limiter for PeriodicLimiter<S> {
    #[tracing::instrument(skip(self, quota), fields(qty))]
    async fn rate_limit(&self, key: &str, qty: u64, quota: Quota) -> Result<RateLimitResult> {
        let now = self.store.current_time().await?;
        let old = self.store.get(key).await?;
        let period = chrono::Duration::from_std(quota.period()).unwrap_or(chrono::Duration::zero());
        let limit = quota.limit();

        // Elapsed time since the current window started, as of this
        // request — zero for a brand-new key, since there is no prior
        // window to measure against.
        let elapsed = match &old {
            Some(data) => now - data.created_at,
            None => chrono::Duration::zero(),
        };

        if let Some(ref data) = old {
            if elapsed < period && (data.remaining == 0 || data.remaining < qty) {
                let reset_after = Self::reset_after(period, elapsed);
                tracing::debug!(key, remaining = data.remaining, "window exhausted, request limited");
                return Ok(RateLimitResult::new(
                    quota.count(),
                    true,
                    data.remaining,
                    reset_after,
                    reset_after,
                ));
            }
        }

        let rollover = match &old {
            Some(_) => elapsed > period,
            None => true,
        };

        let base = if rollover {
            LimitData::new(0, limit, now)
        } else {
            old.clone().expect("non-rollover path always has a prior entry")
        };

        let updated = base.copy_with(
            Some(base.used + qty),
            Some(base.remaining.saturating_sub(qty)),
            None,
        );

        if rollover {
            self.store.set(key, updated.clone()).await?;
        } else {
            self.store.compare_and_swap(key, old, updated.clone()).await?;
        }

        let reset_after = Self::reset_after(period, elapsed);

        Ok(RateLimitResult::new(
            quota.count(),
            false,
            updated.remaining,
            reset_after,
            None,
        ))
    }

    async fn reset(&self, key: &str, quota: Quota) -> Result<RateLimitResult> {
        let now = Utc::now();
        let fresh = LimitData::new(0, quota.limit(), now);
        self.store.set(key, fresh.clone()).await?;
        Ok(RateLimitResult::new(
            quota.count(),
            false,
            fresh.remaining,
            Some(quota.period()),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn quota5() -> Quota {
        Quota::per_minute(5, 0)
    }

    #[tokio::test]
    async fn test_s1_five_requests_exhaust_quota() {
        let limiter = PeriodicLimiter::new(MemoryStore::new());
        let quota = quota5();
        let mut last = None;
        for _ in 0..5 {
            let result = limiter.rate_limit("k", 1, quota).await.unwrap();
            assert!(!result.limited);
            last = Some(result);
        }
        assert_eq!(last.unwrap().remaining, 0);
    }

    #[tokio::test]
    async fn test_s2_sixth_request_is_limited() {
        let limiter = PeriodicLimiter::new(MemoryStore::new());
        let quota = quota5();
        for _ in 0..5 {
            limiter.rate_limit("k", 1, quota).await.unwrap();
        }
        let result = limiter.rate_limit("k", 1, quota).await.unwrap();
        assert!(result.limited);
        assert_eq!(result.remaining, 0);
    }

    #[tokio::test]
    async fn test_cas_mismatch_propagates() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let limiter = PeriodicLimiter::new(store.clone());
        let quota = quota5();
        limiter.rate_limit("k", 1, quota).await.unwrap();

        // Force a stale write underneath the limiter so its next CAS
        // observes a different value than it read.
        let current = store.get("k").await.unwrap().unwrap();
        store
            .set("k", current.copy_with(Some(99), Some(0), None))
            .await
            .unwrap();

        // Can't directly force a CAS race without internal access, but we
        // can confirm a plain compare_and_swap against the earlier value
        // now fails with the documented error kind.
        let err = store
            .compare_and_swap("k", Some(current), current_fresh())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::RateLimitError::Storage(
                crate::error::StorageError::CompareAndSwapMismatch { .. }
            )
        ));
    }

    fn current_fresh() -> LimitData {
        LimitData::new(1, 4, Utc::now())
    }

    #[tokio::test]
    async fn test_reset_restores_full_headroom() {
        let limiter = PeriodicLimiter::new(MemoryStore::new());
        let quota = quota5();
        limiter.rate_limit("k", 3, quota).await.unwrap();
        let result = limiter.reset("k", quota).await.unwrap();
        assert!(!result.limited);
        assert_eq!(result.remaining, 5);
    }
}
