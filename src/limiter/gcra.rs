//! Generic Cell Rate Algorithm: continuous-time leaky-bucket limiting.

use std::time::Duration;

use chrono::Utc;

use crate::error::Result;
use crate::limit_data::LimitData;
use crate::limiter::Limiter;
use crate::quota::Quota;
use crate::result::RateLimitResult;
use crate::storage::Store;

/// Continuous-time rate limiter modeling a single monotonically advancing
/// Theoretical Arrival Time (TAT) per key.
///
/// When `S` is [`crate::storage::RedisStore`], decisions are pushed into a
/// server-side script via [`crate::storage::Store::gcra_fast_path`] instead
/// of the portable `get`/`compare_and_swap` sequence below.
pub struct GCRALimiter<S> {
    store: S,
}

impl<S: Store> GCRALimiter<S> {
    /// Build a limiter over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn secs_to_duration(secs: f64) -> Duration {
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

/// round-half-up, matching the spec's `floor(x + 0.5)`.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

impl<S: Store> Limiter for GCRALimiter<S> {
    #[tracing::instrument(skip(self, quota), fields(qty))]
    async fn rate_limit(&self, key: &str, qty: u64, quota: Quota) -> Result<RateLimitResult> {
        let limit = quota.limit();
        let period_secs = quota.period().as_secs_f64();
        let emission_interval = period_secs / limit.max(1) as f64;
        let increment = emission_interval * qty as f64;
        let delay_variation_tolerance = emission_interval * limit as f64;

        if let Some(outcome) = self
            .store
            .gcra_fast_path(
                key,
                emission_interval,
                delay_variation_tolerance,
                increment,
                qty != 0,
            )
            .await?
        {
            let (allowed, remaining, reset_after, retry_after) = outcome;
            return Ok(RateLimitResult::new(
                quota.count(),
                !allowed,
                round_half_up(remaining).max(0) as u64,
                reset_after,
                retry_after,
            ));
        }

        let now = self.store.current_time().await?;
        let data = self.store.get(key).await?;
        let tat = data.as_ref().and_then(|d| d.time).unwrap_or(now);

        let tat_secs = (tat - now).num_nanoseconds().unwrap_or(0) as f64 / 1e9;
        let new_tat_secs = tat_secs.max(0.0) + increment;
        let allow_at_secs = new_tat_secs - delay_variation_tolerance;
        let diff = -allow_at_secs;
        let remaining = round_half_up(diff / emission_interval);

        let reset_after_secs = tat_secs;
        let reset_after = if reset_after_secs > 0.0 {
            Some(Self::secs_to_duration(reset_after_secs))
        } else {
            None
        };

        let (limited, remaining_u64, retry_after, new_time) = if remaining < 1 {
            let retry_after_secs = emission_interval - diff;
            tracing::debug!(key, "bucket exhausted, request limited");
            (
                true,
                0u64,
                Some(Self::secs_to_duration(retry_after_secs)),
                tat,
            )
        } else {
            let new_tat = now + chrono::Duration::nanoseconds((new_tat_secs * 1e9) as i64);
            (false, remaining as u64, None, new_tat)
        };

        let admitted = if limited { 0 } else { qty };
        let updated = match &data {
            Some(d) => d.copy_with(
                Some(d.used + admitted),
                Some(remaining_u64),
                Some(new_time),
            ),
            None => LimitData::with_time(admitted, remaining_u64, now, new_time),
        };

        self.store.compare_and_swap(key, data, updated).await?;

        Ok(RateLimitResult::new(
            quota.count(),
            limited,
            remaining_u64,
            reset_after,
            retry_after,
        ))
    }

    async fn reset(&self, key: &str, quota: Quota) -> Result<RateLimitResult> {
        let now = Utc::now();
        let period = chrono::Duration::from_std(quota.period()).unwrap_or(chrono::Duration::zero());
        let fresh = LimitData::with_time(0, quota.limit(), now, now - period * 2);
        self.store.set(key, fresh.clone()).await?;
        Ok(RateLimitResult::new(
            quota.count(),
            false,
            fresh.remaining,
            None,
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_s4_fresh_key_admits_first_request() {
        let limiter = GCRALimiter::new(MemoryStore::new());
        let quota = Quota::new(Duration::from_secs(60), 50, 0).unwrap();
        let result = limiter.rate_limit("k", 1, quota).await.unwrap();
        assert!(!result.limited);
        assert_eq!(result.remaining, 49);
        assert_eq!(result.retry_after, None);
    }

    #[tokio::test]
    async fn test_s5_second_request_within_emission_interval() {
        let limiter = GCRALimiter::new(MemoryStore::new());
        let quota = Quota::new(Duration::from_secs(60), 50, 0).unwrap();
        limiter.rate_limit("k", 1, quota).await.unwrap();
        let result = limiter.rate_limit("k", 1, quota).await.unwrap();
        assert!(!result.limited);
        assert_eq!(result.remaining, 48);
        let reset_after = result.reset_after.unwrap();
        assert!(reset_after > Duration::ZERO && reset_after < Duration::from_secs_f64(60.0 / 50.0));
    }

    #[tokio::test]
    async fn test_qty_greater_than_limit_is_rejected() {
        let limiter = GCRALimiter::new(MemoryStore::new());
        let quota = Quota::new(Duration::from_secs(60), 10, 0).unwrap();
        let result = limiter.rate_limit("k", 11, quota).await.unwrap();
        assert!(result.limited);
        assert_eq!(result.remaining, 0);
    }

    #[tokio::test]
    async fn test_peek_does_not_consume_capacity() {
        let limiter = GCRALimiter::new(MemoryStore::new());
        let quota = Quota::new(Duration::from_secs(60), 10, 0).unwrap();
        let first = limiter.rate_limit("k", 0, quota).await.unwrap();
        let second = limiter.rate_limit("k", 0, quota).await.unwrap();
        assert_eq!(first.remaining, second.remaining);
        assert!(!first.limited);
    }

    #[tokio::test]
    async fn test_reset_restores_full_headroom() {
        let limiter = GCRALimiter::new(MemoryStore::new());
        let quota = Quota::new(Duration::from_secs(60), 10, 0).unwrap();
        limiter.rate_limit("k", 5, quota).await.unwrap();
        let result = limiter.reset("k", quota).await.unwrap();
        assert!(!result.limited);
        assert_eq!(result.remaining, 10);

        let after_reset = limiter.rate_limit("k", 1, quota).await.unwrap();
        assert!(!after_reset.limited);
        assert_eq!(after_reset.remaining, 9);
    }
}
