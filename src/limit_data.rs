//! Per-key bucket state persisted by a [`crate::storage::Store`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `%Y-%m-%dT%H:%M:%S.%f%z` wire format used by [`LimitData::encode`]
/// and [`LimitData::decode`], matching the shared-store persistence format.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";

/// Per-key state describing a rate limit bucket.
///
/// Produced by a limiter on each accepted or rejected request, consumed by
/// the next decision for the same key, and destroyed when the store evicts
/// the key or the caller clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitData {
    /// Count consumed in the current window.
    pub used: u64,
    /// Headroom left: `limit - used` for periodic, last-computed headroom
    /// for GCRA.
    pub remaining: u64,
    /// When the current window or bucket began.
    pub created_at: DateTime<Utc>,
    /// For GCRA, the Theoretical Arrival Time: the earliest future instant
    /// at which the bucket would be completely empty if no further
    /// arrivals occurred. Unused by the periodic limiter.
    pub time: Option<DateTime<Utc>>,
}

impl LimitData {
    /// Construct a fresh bucket.
    pub fn new(used: u64, remaining: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            used,
            remaining,
            created_at,
            time: None,
        }
    }

    /// Construct a bucket with an explicit TAT, for GCRA.
    pub fn with_time(
        used: u64,
        remaining: u64,
        created_at: DateTime<Utc>,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            used,
            remaining,
            created_at,
            time: Some(time),
        }
    }

    /// Return a copy with the given fields overridden.
    pub fn copy_with(
        &self,
        used: Option<u64>,
        remaining: Option<u64>,
        time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            used: used.unwrap_or(self.used),
            remaining: remaining.unwrap_or(self.remaining),
            created_at: self.created_at,
            time: time.or(self.time),
        }
    }

    /// Encode this value as the `(used, remaining, created_at, time)`
    /// string tuple persisted by [`crate::storage::RedisStore`].
    ///
    /// `time` encodes as the empty string when absent.
    pub fn encode(&self) -> [(&'static str, String); 4] {
        [
            ("used", self.used.to_string()),
            ("remaining", self.remaining.to_string()),
            ("created_at", self.created_at.format(DATETIME_FORMAT).to_string()),
            (
                "time",
                self.time
                    .map(|t| t.format(DATETIME_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
        ]
    }

    /// Decode from the string fields stored by [`crate::storage::RedisStore`].
    pub fn decode(
        used: &str,
        remaining: &str,
        created_at: &str,
        time: &str,
    ) -> Result<Self, DecodeError> {
        let used = used.parse().map_err(|_| DecodeError::Field("used"))?;
        let remaining = remaining
            .parse()
            .map_err(|_| DecodeError::Field("remaining"))?;
        let created_at = DateTime::parse_from_str(created_at, DATETIME_FORMAT)
            .map_err(|_| DecodeError::Field("created_at"))?
            .with_timezone(&Utc);
        let time = if time.is_empty() {
            None
        } else {
            Some(
                DateTime::parse_from_str(time, DATETIME_FORMAT)
                    .map_err(|_| DecodeError::Field("time"))?
                    .with_timezone(&Utc),
            )
        };
        Ok(Self {
            used,
            remaining,
            created_at,
            time,
        })
    }
}

/// Failure decoding a [`LimitData`] from its wire representation.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The named field could not be parsed.
    #[error("could not decode field {0:?}")]
    Field(&'static str),
}
