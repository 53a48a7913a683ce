//! Quota configuration for rate limiting.
//!
//! A `Quota` defines the rate limiting parameters: how many requests are allowed
//! over what time period, and optionally how much burst capacity is available.
//!
//! # Examples
//!
//! ```
//! use rush_rs::Quota;
//! use std::time::Duration;
//!
//! // 100 requests per minute
//! let quota = Quota::per_minute(100, 0);
//!
//! // 100 requests per minute with 50 extra burst headroom
//! let quota = Quota::per_minute(100, 50);
//! assert_eq!(quota.limit(), 150);
//!
//! // Custom period and count
//! let quota = Quota::new(Duration::from_secs(30), 50, 0).unwrap();
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Rate limiting quota configuration.
///
/// `limit()` (the capacity a limiter actually enforces) is `count +
/// maximum_burst`; `count` alone is the nominal, steady-state rate reported
/// back to callers in [`crate::result::RateLimitResult::limit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    period: Duration,
    count: u64,
    maximum_burst: u64,
}

impl Quota {
    /// Create a new quota.
    ///
    /// Returns [`ConfigError::InvalidQuota`] if `period` is zero.
    pub fn new(period: Duration, count: u64, maximum_burst: u64) -> Result<Self> {
        if period.is_zero() {
            return Err(ConfigError::InvalidQuota("period must be a positive value".into()).into());
        }
        Ok(Self {
            period,
            count,
            maximum_burst,
        })
    }

    /// Create a quota allowing `count` requests per second.
    pub fn per_second(count: u64, burst: u64) -> Self {
        Self {
            period: Duration::from_secs(1),
            count,
            maximum_burst: burst,
        }
    }

    /// Create a quota allowing `count` requests per minute.
    pub fn per_minute(count: u64, burst: u64) -> Self {
        Self {
            period: Duration::from_secs(60),
            count,
            maximum_burst: burst,
        }
    }

    /// Create a quota allowing `count` requests per hour.
    pub fn per_hour(count: u64, burst: u64) -> Self {
        Self {
            period: Duration::from_secs(3600),
            count,
            maximum_burst: burst,
        }
    }

    /// Create a quota allowing `count` requests per day.
    pub fn per_day(count: u64, burst: u64) -> Self {
        Self {
            period: Duration::from_secs(86400),
            count,
            maximum_burst: burst,
        }
    }

    /// The time between equally spaced requests at the steady-state rate.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// The number of requests allowed per period, not including burst.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Additional headroom for bursts, on top of `count`.
    pub fn maximum_burst(&self) -> u64 {
        self.maximum_burst
    }

    /// The full bucket capacity: `count + maximum_burst`.
    pub fn limit(&self) -> u64 {
        self.count + self.maximum_burst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_per_second() {
        let quota = Quota::per_second(10, 0);
        assert_eq!(quota.count(), 10);
        assert_eq!(quota.period(), Duration::from_secs(1));
        assert_eq!(quota.limit(), 10);
    }

    #[test]
    fn test_quota_per_minute() {
        let quota = Quota::per_minute(60, 0);
        assert_eq!(quota.period(), Duration::from_secs(60));
    }

    #[test]
    fn test_quota_per_hour() {
        let quota = Quota::per_hour(3600, 0);
        assert_eq!(quota.period(), Duration::from_secs(3600));
    }

    #[test]
    fn test_quota_limit_includes_burst() {
        let quota = Quota::per_minute(60, 40);
        assert_eq!(quota.count(), 60);
        assert_eq!(quota.maximum_burst(), 40);
        assert_eq!(quota.limit(), 100);
    }

    #[test]
    fn test_quota_zero_period_rejected() {
        let result = Quota::new(Duration::ZERO, 10, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_quota_custom_period() {
        let quota = Quota::new(Duration::from_secs(30), 50, 0).unwrap();
        assert_eq!(quota.period(), Duration::from_secs(30));
        assert_eq!(quota.count(), 50);
    }
}
