//! File-snapshotted store
//!
//! Behaves like [`MemoryStore`] but rewrites the whole table to a JSON
//! snapshot after every mutation. On open, the snapshot is read back and
//! every entry re-inserted with a fresh time-to-live.
//!
//! Snapshot layout is a flat object of cache key to stored record text:
//!
//! ```text
//! {"Tessera:alice":"{\"userKey\":\"alice\",\"token\":\"...\",...}"}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tessera_types::SessionRecord;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::{CacheResult, MemoryStore, SessionStore};

/// Snapshot file name suffix, placed after the sanitized key prefix
pub const SNAPSHOT_FILE_NAME: &str = "tessera.dat";

/// Session store that survives restarts through a snapshot file
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    /// Serializes snapshot writes so the newest table always lands last
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl FileStore {
    /// Default snapshot location for a key prefix: the system temp dir,
    /// with `:` in the prefix replaced by `_`
    pub fn default_path(prefix: &str) -> PathBuf {
        let name = format!("{}{}", prefix.replace(':', "_"), SNAPSHOT_FILE_NAME);
        std::env::temp_dir().join(name)
    }

    /// Open the store, restoring any snapshot found at `path`.
    ///
    /// A missing snapshot starts empty. A snapshot that does not decode as
    /// a JSON table, non-UTF-8 bytes included, is logged and ignored; the
    /// next mutation overwrites it. Any other read failure fails the open.
    pub async fn open(path: impl Into<PathBuf>, ttl: Duration) -> CacheResult<Self> {
        let store = Self {
            inner: MemoryStore::new(ttl),
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        store.restore().await?;
        Ok(store)
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn restore(&self) -> CacheResult<()> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no session snapshot to restore");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let table: BTreeMap<String, String> = match serde_json::from_slice(&contents) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt session snapshot");
                return Ok(());
            }
        };

        let restored = table.len();
        for (key, value) in table {
            self.inner.insert_raw(key, value).await;
        }
        tracing::debug!(path = %self.path.display(), restored, "session snapshot restored");
        Ok(())
    }

    /// Rewrite the snapshot with the current table.
    ///
    /// Written to a sibling temp file and renamed into place so a crash
    /// mid-write never leaves a truncated snapshot.
    async fn persist(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;

        let table: BTreeMap<String, String> = self.inner.entries().into_iter().collect();
        let json = serde_json::to_string(&table)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    #[instrument(skip(self, record), level = "trace")]
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()> {
        self.inner.set(key, record).await?;
        self.persist().await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>> {
        self.inner.get(key).await
    }

    #[instrument(skip(self), level = "trace")]
    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.inner.remove(key).await?;
        self.persist().await
    }
}
