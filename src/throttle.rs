//! Binds a [`Quota`] to a [`Limiter`], exposing the caller-facing surface.

use crate::error::Result;
use crate::limiter::Limiter;
use crate::quota::Quota;
use crate::result::RateLimitResult;

/// An immutable `(quota, limiter)` pair. The unit callers reach for.
pub struct Throttle<L> {
    quota: Quota,
    limiter: L,
}

impl<L: Limiter> Throttle<L> {
    /// Bind a quota to a limiter.
    pub fn new(quota: Quota, limiter: L) -> Self {
        Self { quota, limiter }
    }

    /// The bound quota.
    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Check whether `qty` units of traffic fit the quota for `key`.
    pub async fn check(&self, key: &str, qty: u64) -> Result<RateLimitResult> {
        self.limiter.rate_limit(key, qty, self.quota).await
    }

    /// Inspect the current headroom for `key` without consuming capacity.
    pub async fn peek(&self, key: &str) -> Result<RateLimitResult> {
        self.limiter.rate_limit(key, 0, self.quota).await
    }

    /// Reset `key` to a fresh, fully available bucket.
    pub async fn clear(&self, key: &str) -> Result<RateLimitResult> {
        self.limiter.reset(key, self.quota).await
    }
}
