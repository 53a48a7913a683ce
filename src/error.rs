//! Error types for rate limiting operations.
//!
//! This module provides a comprehensive error hierarchy for all rate limiting
//! operations, including storage errors, configuration errors, and CAS conflicts.

use std::time::Duration;

use thiserror::Error;

use crate::limit_data::LimitData;

/// Result type for rate limiting operations.
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Main error type for rate limiting operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection error (e.g., Redis connection failed).
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Rate limit exceeded with retry information, raised by the decorator.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded {
        /// How long to wait before retrying.
        retry_after: Option<Duration>,
        /// Current remaining quota.
        remaining: u64,
        /// Maximum quota limit.
        limit: u64,
    },
}

/// Storage-related errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The observed value at `compare_and_swap` time did not match `old`.
    ///
    /// Carries the value actually found in the store (`None` if the key was
    /// absent) so the caller can recompute its decision and retry.
    #[error("compare-and-swap mismatch")]
    CompareAndSwapMismatch {
        /// The value the store actually held.
        observed: Option<LimitData>,
    },

    /// The backing store detected a racing writer between watch and
    /// execute. Distinct from [`StorageError::CompareAndSwapMismatch`]
    /// because the comparison itself never happened — retrying is safe.
    #[error("concurrent mutation detected under watch: {source}")]
    ConcurrentStoreMutation {
        /// The underlying cause reported by the store.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Serialization/deserialization of a [`LimitData`] failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic storage operation failure.
    #[error("{message}")]
    OperationFailed {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },
}

impl StorageError {
    /// Create a new operation failed error.
    pub fn operation_failed(message: impl Into<String>, retryable: bool) -> Self {
        Self::OperationFailed {
            message: message.into(),
            retryable,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OperationFailed { retryable, .. } => *retryable,
            Self::ConcurrentStoreMutation { .. } => true,
            Self::CompareAndSwapMismatch { .. } => true,
            Self::Serialization(_) => false,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid quota configuration (non-positive period).
    #[error("invalid quota: {0}")]
    InvalidQuota(String),

    /// The URL given to a shared store was missing a scheme or used one
    /// the store doesn't support.
    #[error("invalid store URL {url:?}: {detail}")]
    InvalidStoreUrl {
        /// The offending URL, verbatim.
        url: String,
        /// Human-readable validation detail.
        detail: String,
    },
}

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Failed to connect.
    #[error("failed to connect: {0}")]
    ConnectionFailed(String),

    /// Connection timeout.
    #[error("connection timeout after {0:?}")]
    Timeout(Duration),

    /// Connection pool exhausted.
    #[error("connection pool exhausted")]
    PoolExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_retryable() {
        let err = StorageError::operation_failed("test", true);
        assert!(err.is_retryable());

        let err = StorageError::operation_failed("test", false);
        assert!(!err.is_retryable());

        let err = StorageError::ConcurrentStoreMutation {
            source: "watch race".into(),
        };
        assert!(err.is_retryable());

        let err = StorageError::CompareAndSwapMismatch { observed: None };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = RateLimitError::RateLimitExceeded {
            retry_after: Some(Duration::from_secs(10)),
            remaining: 0,
            limit: 100,
        };
        assert!(err.to_string().contains("retry after"));
    }
}
