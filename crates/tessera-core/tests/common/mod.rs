//! Common test utilities for tessera-core integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tessera_cache::{CacheError, CacheResult, MemoryStore};
use tessera_core::{SessionRecord, SessionStore, TokenManager, TokenOptions};

pub const TEST_KEY: &[u8] = b"integration-test-key-0123456789!";

/// Options with a non-default key and the given timeout
pub fn options(timeout: Duration) -> TokenOptions {
    TokenOptions::new()
        .with_encrypt_key(TEST_KEY)
        .with_timeout(timeout)
}

/// Manager over a fresh in-memory store
pub fn memory_manager(options: TokenOptions) -> TokenManager {
    let store = Arc::new(MemoryStore::new(options.timeout));
    TokenManager::new(options, store).expect("valid options")
}

/// In-memory store whose writes can be switched to fail
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: MemoryStore::new(ttl),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_error() -> CacheError {
        CacheError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn set(&self, key: &str, record: &SessionRecord) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        self.inner.set(key, record).await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<SessionRecord>> {
        self.inner.get(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        self.inner.remove(key).await
    }
}
