//! The decision record returned by a rate limit check.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// The result of checking a rate limit.
///
/// `reset_after`/`retry_after` use `None` where the Python original uses a
/// `-1` sentinel duration — "not meaningfully defined" — since
/// `std::time::Duration` cannot represent a negative value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitResult {
    /// The quota's nominal count, not including burst. Reported to the
    /// caller regardless of how much burst headroom the limiter actually
    /// enforces internally.
    pub limit: u64,
    /// Whether this request should be rejected.
    pub limited: bool,
    /// Headroom remaining after this decision. Zero when limited.
    pub remaining: u64,
    /// How long until the bucket is fully empty again.
    pub reset_after: Option<Duration>,
    /// How long the caller should wait before retrying. `None` when not
    /// limited.
    pub retry_after: Option<Duration>,
}

impl RateLimitResult {
    /// Construct a new result.
    pub fn new(
        limit: u64,
        limited: bool,
        remaining: u64,
        reset_after: Option<Duration>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self {
            limit,
            limited,
            remaining,
            reset_after,
            retry_after,
        }
    }

    /// The absolute instant at which the bucket resets, relative to `now`.
    ///
    /// Returns `None` if `reset_after` is not meaningfully defined.
    pub fn resets_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.reset_after
            .map(|d| now + chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero()))
    }

    /// The absolute instant at which the caller may retry, relative to `now`.
    ///
    /// Returns `None` if the request was not limited.
    pub fn retry_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.retry_after
            .map(|d| now + chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero()))
    }
}
