//! Token engine options

use std::path::PathBuf;
use std::time::Duration;

use tessera_cache::{FileStore, StoreSettings};
use tessera_types::CacheMode;

use crate::ConfigError;

/// Default session timeout (10 days)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 24 * 60 * 60);
/// Default cache key prefix
pub const DEFAULT_CACHE_PREFIX: &str = "Tessera:";
/// Default token field delimiter
pub const DEFAULT_TOKEN_DELIMITER: &str = "_";
/// Built-in encryption key, only suitable for development
pub const DEFAULT_ENCRYPT_KEY: &[u8; 32] = b"tessera-development-key-32-bytes";

/// Token engine options.
///
/// Plain struct with defaults and builder setters; validated once when
/// the [`TokenManager`](crate::TokenManager) is built.
#[derive(Clone)]
pub struct TokenOptions {
    /// Which cache backend stores session records
    pub cache_mode: CacheMode,
    /// Prefix prepended to the user key to form the cache key
    pub cache_prefix: String,
    /// Session time-to-live
    pub timeout: Duration,
    /// Minimum age before a validation extends the session.
    /// `None` means half the timeout; `Some(ZERO)` disables refresh.
    pub max_refresh: Option<Duration>,
    /// Cap on refreshes per session (0 = unlimited)
    pub max_refresh_times: u32,
    /// Separator between user key and salt inside a token
    pub token_delimiter: String,
    /// Symmetric key for the token cipher (16, 24 or 32 bytes)
    pub encrypt_key: Vec<u8>,
    /// Reuse the live token when the same user logs in again
    pub multi_login: bool,
    /// Paths never subject to authentication
    pub auth_exclude_paths: Vec<String>,
    /// Redis URL for [`CacheMode::Redis`]
    pub redis_url: String,
    /// Snapshot location for [`CacheMode::File`]; derived from the prefix
    /// when unset
    pub snapshot_path: Option<PathBuf>,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::Memory,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_refresh: None,
            max_refresh_times: 0,
            token_delimiter: DEFAULT_TOKEN_DELIMITER.to_string(),
            encrypt_key: DEFAULT_ENCRYPT_KEY.to_vec(),
            multi_login: false,
            auth_exclude_paths: Vec::new(),
            redis_url: StoreSettings::DEFAULT_REDIS_URL.to_string(),
            snapshot_path: None,
        }
    }
}

impl std::fmt::Debug for TokenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenOptions")
            .field("cache_mode", &self.cache_mode)
            .field("cache_prefix", &self.cache_prefix)
            .field("timeout", &self.timeout)
            .field("max_refresh", &self.max_refresh())
            .field("max_refresh_times", &self.max_refresh_times)
            .field("token_delimiter", &self.token_delimiter)
            .field("encrypt_key", &"[REDACTED]")
            .field("multi_login", &self.multi_login)
            .field("auth_exclude_paths", &self.auth_exclude_paths)
            .field("snapshot_path", &self.snapshot_path)
            .finish_non_exhaustive()
    }
}

impl TokenOptions {
    /// Create options with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache backend
    #[must_use]
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Set the cache key prefix
    #[must_use]
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Set the session timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the refresh threshold; `Duration::ZERO` disables refresh
    #[must_use]
    pub fn with_max_refresh(mut self, max_refresh: Duration) -> Self {
        self.max_refresh = Some(max_refresh);
        self
    }

    /// Set the refresh cap (0 = unlimited)
    #[must_use]
    pub fn with_max_refresh_times(mut self, times: u32) -> Self {
        self.max_refresh_times = times;
        self
    }

    /// Set the token delimiter
    #[must_use]
    pub fn with_token_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.token_delimiter = delimiter.into();
        self
    }

    /// Set the encryption key
    #[must_use]
    pub fn with_encrypt_key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.encrypt_key = key.as_ref().to_vec();
        self
    }

    /// Enable or disable multi-login
    #[must_use]
    pub fn with_multi_login(mut self, multi_login: bool) -> Self {
        self.multi_login = multi_login;
        self
    }

    /// Set the auth-exclude paths
    #[must_use]
    pub fn with_auth_exclude_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_exclude_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Redis URL
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Set the snapshot file location
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Effective refresh threshold; zero means refresh is disabled
    pub fn max_refresh(&self) -> Duration {
        self.max_refresh.unwrap_or(self.timeout / 2)
    }

    /// Whether the built-in development key is in use
    pub fn uses_default_key(&self) -> bool {
        self.encrypt_key.as_slice() == DEFAULT_ENCRYPT_KEY.as_slice()
    }

    /// Cache key for a user key
    pub fn cache_key(&self, user_key: &str) -> String {
        format!("{}{}", self.cache_prefix, user_key)
    }

    /// Snapshot path, falling back to the temp-dir default for the prefix
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| FileStore::default_path(&self.cache_prefix))
    }

    /// Settings for opening the configured cache backend
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::new(self.timeout)
            .with_redis_url(self.redis_url.clone())
            .with_snapshot_path(self.snapshot_path())
    }

    /// Check the options for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Empty("cache_prefix"));
        }
        if self.token_delimiter.is_empty() {
            return Err(ConfigError::Empty("token_delimiter"));
        }
        if !matches!(self.encrypt_key.len(), 16 | 24 | 32) {
            return Err(ConfigError::Invalid {
                field: "encrypt_key",
                reason: format!("must be 16, 24 or 32 bytes, got {}", self.encrypt_key.len()),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_refresh() > self.timeout {
            return Err(ConfigError::Invalid {
                field: "max_refresh",
                reason: format!(
                    "{:?} exceeds the session timeout {:?}",
                    self.max_refresh(),
                    self.timeout
                ),
            });
        }
        if self.cache_mode == CacheMode::Redis && self.redis_url.is_empty() {
            return Err(ConfigError::Empty("redis_url"));
        }
        Ok(())
    }
}
