//! A GCRA and fixed-window rate limiting library with pluggable,
//! compare-and-swap-based storage backends.
//!
//! The core is three pieces: a [`Quota`] describing the allowed rate, a
//! [`storage::Store`] holding per-key [`LimitData`], and a [`limiter::Limiter`]
//! (either [`limiter::GCRALimiter`] or [`limiter::PeriodicLimiter`]) that turns
//! `(quota, store, key)` into a [`RateLimitResult`]. [`Throttle`] binds the
//! first two together for everyday use.
//!
//! # Quick start
//!
//! ```
//! use rush_rs::{GCRALimiter, MemoryStore, Quota, Throttle};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let throttle = Throttle::new(Quota::per_second(10, 5), GCRALimiter::new(MemoryStore::new()));
//!
//! let result = throttle.check("user:123", 1).await.unwrap();
//! if result.limited {
//!     println!("rate limited, retry after {:?}", result.retry_after);
//! } else {
//!     println!("admitted, {} remaining", result.remaining);
//! }
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `memory` (default): [`MemoryStore`] and [`storage::BoundedStore`].
//! - `redis`: [`storage::RedisStore`], backed by `deadpool-redis`.
//! - `axum-demo`: example web handler under `demos/`, not part of the
//!   library surface.

pub mod decorator;
pub mod error;
pub mod headers;
pub mod limit_data;
pub mod limiter;
pub mod quota;
pub mod result;
pub mod storage;
pub mod throttle;

pub use error::{ConfigError, ConnectionError, RateLimitError, Result, StorageError};
pub use limit_data::LimitData;
pub use limiter::{GCRALimiter, Limiter, PeriodicLimiter};
pub use quota::Quota;
pub use result::RateLimitResult;
pub use throttle::Throttle;

#[cfg(feature = "memory")]
pub use storage::{BoundedStore, MemoryStore};
#[cfg(feature = "redis")]
pub use storage::{RedisConfig, RedisStore};

/// Convenient re-exports for the common case.
pub mod prelude {
    pub use crate::decorator::{sleep_and_retry, throttle_fn};
    pub use crate::error::{RateLimitError, Result};
    pub use crate::limiter::{GCRALimiter, Limiter, PeriodicLimiter};
    pub use crate::quota::Quota;
    pub use crate::result::RateLimitResult;
    pub use crate::storage::Store;
    pub use crate::throttle::Throttle;

    #[cfg(feature = "memory")]
    pub use crate::storage::{BoundedStore, MemoryStore};
    #[cfg(feature = "redis")]
    pub use crate::storage::{RedisConfig, RedisStore};
}
