//! Store trait and backend selection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tessera_types::{CacheMode, SessionRecord};

use crate::{CacheResult, FileStore, MemoryStore, RedisStore};

/// Key/value storage for session records.
///
/// Implementations must be safe for concurrent single-key access. No
/// cross-call atomicity is promised: a read followed by a write can
/// interleave with another caller's write to the same key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert a record, resetting its time-to-live to the store timeout.
    ///
    /// Fails with [`CacheError::EmptyRecord`](crate::CacheError::EmptyRecord)
    /// for a record with no identity and no token.
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()>;

    /// Load a record; `None` when the key is absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>>;

    /// Delete a record; deleting a missing key succeeds
    async fn remove(&self, key: &str) -> CacheResult<()>;
}

/// Settings shared by all backends
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Time-to-live applied on every `set`
    pub ttl: Duration,
    /// Redis connection URL (redis backend only)
    pub redis_url: String,
    /// Snapshot file location (file backend only)
    pub snapshot_path: PathBuf,
}

impl StoreSettings {
    /// Default Redis URL
    pub const DEFAULT_REDIS_URL: &'static str = "redis://127.0.0.1/";

    /// Create settings with the given TTL and default locations
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            redis_url: Self::DEFAULT_REDIS_URL.to_string(),
            snapshot_path: FileStore::default_path(""),
        }
    }

    /// Set the Redis URL
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Set the snapshot file path
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }
}

/// Open the backend selected by `mode`
pub async fn open(mode: CacheMode, settings: &StoreSettings) -> CacheResult<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match mode {
        CacheMode::Memory => Arc::new(MemoryStore::new(settings.ttl)),
        CacheMode::Redis => Arc::new(RedisStore::connect(&settings.redis_url, settings.ttl).await?),
        CacheMode::File => {
            Arc::new(FileStore::open(settings.snapshot_path.clone(), settings.ttl).await?)
        }
    };
    tracing::debug!(%mode, ttl_ms = settings.ttl.as_millis() as u64, "session store opened");
    Ok(store)
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()> {
        (**self).set(key, record).await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>> {
        (**self).get(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key).await
    }
}
