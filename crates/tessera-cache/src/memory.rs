//! In-process TTL store
//!
//! Records live in a moka cache whose time-to-live equals the session
//! timeout. Every `set` re-inserts the entry, which restarts its TTL.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tessera_types::SessionRecord;
use tracing::instrument;

use crate::{CacheError, CacheResult, SessionStore};

/// In-process session store.
///
/// Values are kept as serialized JSON so that every backend shares the
/// same decode path and failure modes.
///
/// # Thread Safety
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, String>,
    ttl: Duration,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an unbounded store with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Copy of every live entry as raw stored text
    pub(crate) fn entries(&self) -> Vec<(String, String)> {
        self.cache
            .iter()
            .map(|(key, value)| (key.as_ref().clone(), value))
            .collect()
    }

    /// Insert already-serialized text, as read back from a snapshot
    pub(crate) async fn insert_raw(&self, key: String, value: String) {
        self.cache.insert(key, value).await;
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[instrument(skip(self, record), level = "trace")]
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()> {
        if record.is_empty() {
            return Err(CacheError::EmptyRecord);
        }
        let value = record.to_json()?;
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    #[instrument(skip(self), level = "trace")]
    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>> {
        match self.cache.get(key).await {
            Some(raw) => Ok(Some(SessionRecord::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), level = "trace")]
    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
