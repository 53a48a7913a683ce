//! HTTP header names and formatting for attaching a [`RateLimitResult`] to
//! a response. Peripheral to the core decision engine — callers own the
//! actual attachment to their transport layer.

use chrono::Utc;

use crate::limit_data::DATETIME_FORMAT;
use crate::result::RateLimitResult;

/// Standard rate limit header names.
pub mod names {
    /// The quota's nominal count.
    pub const RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// Headroom remaining after the decision.
    pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// Absolute instant the bucket next fully resets.
    pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// Absolute instant the caller may retry, present only when limited.
    pub const RATE_LIMIT_RETRY: &str = "X-RateLimit-Retry";
}

/// Builder producing the `(name, value)` pairs for a [`RateLimitResult`].
#[derive(Debug, Default)]
pub struct RateLimitHeaders {
    limit: Option<u64>,
    remaining: Option<u64>,
    reset: Option<String>,
    retry: Option<String>,
}

impl RateLimitHeaders {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit header.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the remaining header.
    pub fn remaining(mut self, remaining: u64) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Set the reset header to an already-formatted timestamp.
    pub fn reset(mut self, reset: impl Into<String>) -> Self {
        self.reset = Some(reset.into());
        self
    }

    /// Set the retry header to an already-formatted timestamp.
    pub fn retry(mut self, retry: impl Into<String>) -> Self {
        self.retry = Some(retry.into());
        self
    }

    /// Convert to a vector of `(name, value)` pairs, in header order.
    pub fn to_vec(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(limit) = self.limit {
            headers.push((names::RATE_LIMIT_LIMIT, limit.to_string()));
        }
        if let Some(remaining) = self.remaining {
            headers.push((names::RATE_LIMIT_REMAINING, remaining.to_string()));
        }
        if let Some(ref reset) = self.reset {
            headers.push((names::RATE_LIMIT_RESET, reset.clone()));
        }
        if let Some(ref retry) = self.retry {
            headers.push((names::RATE_LIMIT_RETRY, retry.clone()));
        }
        headers
    }
}

impl From<&RateLimitResult> for RateLimitHeaders {
    fn from(result: &RateLimitResult) -> Self {
        let now = Utc::now();
        let mut headers = Self::new().limit(result.limit).remaining(result.remaining);

        if let Some(reset_at) = result.resets_at(now) {
            headers = headers.reset(reset_at.format(DATETIME_FORMAT).to_string());
        }
        if let Some(retry_at) = result.retry_at(now) {
            headers = headers.retry(retry_at.format(DATETIME_FORMAT).to_string());
        }

        headers
    }
}
