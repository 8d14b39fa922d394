//! Redis-backed store
//!
//! Records are stored as JSON strings with a server-side expiry set by
//! `SETEX`. Redis expiry has second granularity, so the millisecond
//! timeout is truncated to whole seconds with a floor of one second.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tessera_types::SessionRecord;
use tracing::instrument;

use crate::{CacheError, CacheResult, SessionStore};

/// Session store backed by a Redis server.
///
/// Uses a multiplexed [`ConnectionManager`] that reconnects on failure;
/// clones share the same connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to `url` and use `ttl` as the expiry of every record
    pub async fn connect(url: &str, ttl: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_manager(conn, ttl))
    }

    /// Wrap an existing connection manager
    pub fn from_manager(conn: ConnectionManager, ttl: Duration) -> Self {
        Self {
            conn,
            ttl_secs: ttl_seconds(ttl),
        }
    }

    /// Expiry passed to `SETEX`
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

/// Whole seconds for `SETEX`, never zero
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SessionStore for RedisStore {
    #[instrument(skip(self, record), level = "trace")]
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()> {
        if record.is_empty() {
            return Err(CacheError::EmptyRecord);
        }
        let value = record.to_json()?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, self.ttl_secs).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "trace")]
    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(SessionRecord::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), level = "trace")]
    async fn remove(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
