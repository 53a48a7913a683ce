//! Bounded, TTL-evicting in-memory store.

use std::num::NonZeroUsize;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;

use crate::error::{Result, StorageError};
use crate::limit_data::LimitData;
use crate::storage::Store;

struct Slot {
    data: LimitData,
    expires_at: DateTime<Utc>,
}

/// In-memory store with a maximum entry count and a time-to-live.
///
/// Eviction is least-recently-used among entries whose TTL has not
/// expired; expired entries are purged lazily on access. CAS is
/// mutex-guarded, same as [`crate::storage::MemoryStore`].
pub struct BoundedStore {
    data: Mutex<LruCache<String, Slot>>,
    ttl: Duration,
}

impl std::fmt::Debug for BoundedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedStore")
            .field("entries", &self.data.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl BoundedStore {
    /// Create a store holding at most `maxsize` entries, each valid for
    /// `ttl` from the time it was last written.
    pub fn new(maxsize: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(maxsize).unwrap_or(NonZeroUsize::MIN);
        Self {
            data: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    fn is_expired(slot: &Slot, now: DateTime<Utc>) -> bool {
        slot.expires_at <= now
    }
}

impl Store for BoundedStore {
    async fn get(&self, key: &str) -> Result<Option<LimitData>> {
        let now = Utc::now();
        let mut guard = self.data.lock();
        match guard.get(key) {
            Some(slot) if !Self::is_expired(slot, now) => Ok(Some(slot.data.clone())),
            Some(_) => {
                guard.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, data: LimitData) -> Result<LimitData> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        self.data.lock().put(
            key.to_string(),
            Slot {
                data: data.clone(),
                expires_at,
            },
        );
        Ok(data)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        old: Option<LimitData>,
        new: LimitData,
    ) -> Result<LimitData> {
        let now = Utc::now();
        let mut guard = self.data.lock();

        let current = match guard.get(key) {
            Some(slot) if !Self::is_expired(slot, now) => Some(slot.data.clone()),
            Some(_) => {
                guard.pop(key);
                None
            }
            None => None,
        };

        if current == old {
            let expires_at =
                now + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
            guard.put(
                key.to_string(),
                Slot {
                    data: new.clone(),
                    expires_at,
                },
            );
            Ok(new)
        } else {
            Err(StorageError::CompareAndSwapMismatch { observed: current }.into())
        }
    }

    async fn current_time(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}
