//! Rate limiting algorithms over a [`crate::storage::Store`].

mod gcra;
mod periodic;

pub use gcra::GCRALimiter;
pub use periodic::PeriodicLimiter;

use std::future::Future;

use crate::error::Result;
use crate::quota::Quota;
use crate::result::RateLimitResult;

/// A rate-limiting algorithm bound to a [`crate::storage::Store`].
///
/// Implementations read the store once per decision, compute the new
/// bucket state, and persist it via [`crate::storage::Store::compare_and_swap`].
/// CAS failures propagate to the caller unchanged — limiters never retry.
pub trait Limiter: Send + Sync {
    /// Evaluate `qty` units of traffic against `quota` for `key`.
    fn rate_limit(
        &self,
        key: &str,
        qty: u64,
        quota: Quota,
    ) -> impl Future<Output = Result<RateLimitResult>> + Send;

    /// Reset `key` to a fresh, fully available bucket.
    fn reset(&self, key: &str, quota: Quota) -> impl Future<Output = Result<RateLimitResult>> + Send;
}
