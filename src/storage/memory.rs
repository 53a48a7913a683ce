//! In-memory store backed by a mutex-guarded map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{Result, StorageError};
use crate::limit_data::LimitData;
use crate::storage::Store;

/// Reference in-memory [`Store`] implementation.
///
/// A plain `HashMap` protected by a `parking_lot::Mutex`. `compare_and_swap`
/// acquires the mutex, reads, compares for structural equality against
/// `old`, and either writes `new` and returns it, or raises
/// [`StorageError::CompareAndSwapMismatch`] with the observed value.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, LimitData>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.data.lock().len())
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    pub fn with_initial(entries: HashMap<String, LimitData>) -> Self {
        Self {
            data: Mutex::new(entries),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<LimitData>> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, data: LimitData) -> Result<LimitData> {
        self.data.lock().insert(key.to_string(), data.clone());
        Ok(data)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        old: Option<LimitData>,
        new: LimitData,
    ) -> Result<LimitData> {
        let mut guard = self.data.lock();
        let current = guard.get(key).cloned();
        if current == old {
            guard.insert(key.to_string(), new.clone());
            Ok(new)
        } else {
            tracing::debug!(key, "compare-and-swap mismatch");
            Err(StorageError::CompareAndSwapMismatch { observed: current }.into())
        }
    }

    async fn current_time(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}
