//! Store backend trait and implementations.
//!
//! This module defines the [`Store`] trait every storage backend must
//! implement, plus the built-in in-memory, bounded in-memory, and Redis
//! implementations.

#[cfg(feature = "memory")]
mod bounded;
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "memory")]
pub use bounded::BoundedStore;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis::{RedisConfig, RedisStore};

use std::future::Future;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::Result;
use crate::limit_data::LimitData;

/// Store backend trait for rate limiting state.
///
/// All operations are async to support both local and distributed
/// backends. Implementations must be thread-safe (`Send + Sync`).
///
/// Implementations must uphold:
/// 1. `get` never partially observes a `set` or successful `compare_and_swap`.
/// 2. A successful `compare_and_swap` is linearizable with respect to other
///    `compare_and_swap` calls on the same key.
/// 3. Timestamps stored and returned are timezone-aware (UTC).
pub trait Store: Send + Sync + 'static {
    /// Retrieve the current state for a key, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<LimitData>>> + Send;

    /// Write `data` unconditionally, returning the stored value.
    fn set(&self, key: &str, data: LimitData) -> impl Future<Output = Result<LimitData>> + Send;

    /// Write `new` iff the store's current value for `key` equals `old`
    /// (absence matches `old = None`).
    ///
    /// Fails with [`crate::error::StorageError::CompareAndSwapMismatch`]
    /// carrying the observed value when the comparison fails, or with
    /// [`crate::error::StorageError::ConcurrentStoreMutation`] when the
    /// backing store detected a racing writer under watch.
    fn compare_and_swap(
        &self,
        key: &str,
        old: Option<LimitData>,
        new: LimitData,
    ) -> impl Future<Output = Result<LimitData>> + Send;

    /// The store's authoritative clock. Shared stores should override this
    /// to the backing service's clock so all processes agree on time.
    fn current_time(&self) -> impl Future<Output = Result<DateTime<Utc>>> + Send {
        async { Ok(Utc::now()) }
    }

    /// Optional remote-execution fast path for [`crate::limiter::GCRALimiter`].
    ///
    /// Stores that can run the whole GCRA decision atomically on the
    /// backing service (see [`crate::storage::RedisStore`]) override this to
    /// return `Some((allowed, remaining, reset_after, retry_after))`. The
    /// default implementation returns `None`, telling the limiter to fall
    /// back to the portable `get`/`compare_and_swap` protocol.
    fn gcra_fast_path(
        &self,
        _key: &str,
        _emission_interval: f64,
        _burst_offset: f64,
        _increment: f64,
        _write: bool,
    ) -> impl Future<
        Output = Result<Option<(bool, f64, Option<std::time::Duration>, Option<std::time::Duration>)>>,
    > + Send {
        async { Ok(None) }
    }

    /// Convenience: `(current_time, get(key))`, filling `time` with
    /// `current_time` when the stored value lacks one, and converting to
    /// the requested zone.
    fn get_with_time<Tz: TimeZone + Send>(
        &self,
        key: &str,
        tz: Tz,
    ) -> impl Future<Output = Result<(DateTime<Tz>, Option<LimitData>)>> + Send
    where
        Tz::Offset: Send,
    {
        async move {
            let now = self.current_time().await?;
            let data = self.get(key).await?;
            let data = data.map(|d| {
                if d.time.is_some() {
                    d
                } else {
                    d.copy_with(None, None, Some(now))
                }
            });
            Ok((now.with_timezone(&tz), data))
        }
    }
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<LimitData>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, data: LimitData) -> Result<LimitData> {
        (**self).set(key, data).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        old: Option<LimitData>,
        new: LimitData,
    ) -> Result<LimitData> {
        (**self).compare_and_swap(key, old, new).await
    }

    async fn current_time(&self) -> Result<DateTime<Utc>> {
        (**self).current_time().await
    }

    async fn gcra_fast_path(
        &self,
        key: &str,
        emission_interval: f64,
        burst_offset: f64,
        increment: f64,
        write: bool,
    ) -> Result<Option<(bool, f64, Option<std::time::Duration>, Option<std::time::Duration>)>> {
        (**self)
            .gcra_fast_path(key, emission_interval, burst_offset, increment, write)
            .await
    }
}
