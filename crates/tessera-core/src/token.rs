//! Token lifecycle
//!
//! Per user key: no session -> `generate` -> active -> `validate` (may
//! refresh) -> active ... -> `destroy` or TTL expiry -> no session.
//!
//! Refresh is a read-modify-write over two store calls and is not atomic.
//! Concurrent validations of one token may double-refresh or lose an
//! increment of the refresh counter. Authorization is unaffected: the
//! token equality check only reads.

use std::sync::Arc;

use serde::Serialize;
use tessera_cache::SessionStore;
use tessera_types::{now_millis, SessionRecord};
use tracing::{debug, instrument, warn};

use crate::codec::{AesTokenCodec, TokenCodec};
use crate::crypto::constant_time_str_eq;
use crate::{TokenError, TokenOptions};

/// Current session for a user key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_key: String,
    #[serde(skip)]
    pub token: String,
    pub data: Option<String>,
}

impl From<SessionRecord> for SessionInfo {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_key: record.user_key,
            token: record.token,
            data: record.data,
        }
    }
}

/// Issues, validates, refreshes and revokes session tokens.
///
/// Cheap to clone; the codec and store are shared.
#[derive(Clone)]
pub struct TokenManager {
    options: Arc<TokenOptions>,
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Build a manager backed by the store selected in `options`
    pub async fn connect(options: TokenOptions) -> Result<Self, TokenError> {
        options.validate()?;
        let store = tessera_cache::open(options.cache_mode, &options.store_settings())
            .await
            .map_err(TokenError::cache("open session store"))?;
        Self::new(options, store)
    }

    /// Build a manager over an existing store with the default codec
    pub fn new(options: TokenOptions, store: Arc<dyn SessionStore>) -> Result<Self, TokenError> {
        options.validate()?;
        let codec = AesTokenCodec::new(options.token_delimiter.clone(), &options.encrypt_key)
            .map_err(|source| TokenError::Codec {
                operation: "build codec",
                source,
            })?;
        Self::with_codec(options, Arc::new(codec), store)
    }

    /// Build a manager with a custom codec
    pub fn with_codec(
        options: TokenOptions,
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, TokenError> {
        options.validate()?;
        if options.uses_default_key() {
            warn!("token encryption key not configured; using the built-in development key");
        }
        debug!(
            cache_mode = %options.cache_mode,
            timeout_ms = options.timeout.as_millis() as u64,
            multi_login = options.multi_login,
            "token manager ready"
        );
        Ok(Self {
            options: Arc::new(options),
            codec,
            store,
        })
    }

    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    /// Issue a token for `user_key`.
    ///
    /// With multi-login enabled a live session's token is returned as is.
    /// Otherwise a new token replaces the session, so earlier tokens for
    /// the user stop validating.
    #[instrument(skip(self, data))]
    pub async fn generate(&self, user_key: &str, data: Option<String>) -> Result<String, TokenError> {
        if user_key.is_empty() {
            return Err(TokenError::MissingParameter("userKey"));
        }
        let key = self.options.cache_key(user_key);

        if self.options.multi_login {
            let existing = self
                .store
                .get(&key)
                .await
                .map_err(TokenError::cache("load session"))?;
            if let Some(record) = existing.filter(|r| !r.token.is_empty()) {
                debug!("reusing live session");
                return Ok(record.token);
            }
        }

        let token = self.codec.encode(user_key).map_err(TokenError::from_encode)?;
        let record = SessionRecord::new(user_key, token.clone(), data);
        self.store
            .set(&key, &record)
            .await
            .map_err(TokenError::cache("store session"))?;

        debug!("session issued");
        Ok(token)
    }

    /// Check a token and return its user key, extending the session when
    /// it is old enough and the refresh budget allows
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<String, TokenError> {
        let record = self.load_current(token).await?;
        let user_key = record.user_key.clone();
        self.refresh(record).await?;
        Ok(user_key)
    }

    /// Read the session of `user_key` without refreshing it
    #[instrument(skip(self))]
    pub async fn get(&self, user_key: &str) -> Result<SessionInfo, TokenError> {
        if user_key.is_empty() {
            return Err(TokenError::MissingParameter("userKey"));
        }
        self.store
            .get(&self.options.cache_key(user_key))
            .await
            .map_err(TokenError::cache("load session"))?
            .map(SessionInfo::from)
            .ok_or(TokenError::Unauthorized)
    }

    /// Read the session a token belongs to, without refreshing it
    #[instrument(skip_all)]
    pub async fn get_by_token(&self, token: &str) -> Result<SessionInfo, TokenError> {
        self.load_current(token).await.map(SessionInfo::from)
    }

    /// Remove the session of `user_key`; removing a missing session succeeds
    #[instrument(skip(self))]
    pub async fn destroy(&self, user_key: &str) -> Result<(), TokenError> {
        if user_key.is_empty() {
            return Err(TokenError::MissingParameter("userKey"));
        }
        self.store
            .remove(&self.options.cache_key(user_key))
            .await
            .map_err(TokenError::cache("remove session"))?;
        debug!("session destroyed");
        Ok(())
    }

    /// Remove the session a token belongs to and return its user key.
    ///
    /// Only the current token can end a session.
    #[instrument(skip_all)]
    pub async fn destroy_by_token(&self, token: &str) -> Result<String, TokenError> {
        let record = self.load_current(token).await?;
        self.destroy(&record.user_key).await?;
        Ok(record.user_key)
    }

    /// Decode `token` and load its session, requiring the token to be the
    /// session's current one
    async fn load_current(&self, token: &str) -> Result<SessionRecord, TokenError> {
        if token.is_empty() {
            return Err(TokenError::MissingParameter("token"));
        }
        let user_key = self.codec.decrypt(token).map_err(TokenError::from_decode)?;

        let record = self
            .store
            .get(&self.options.cache_key(&user_key))
            .await
            .map_err(TokenError::cache("load session"))?
            .ok_or(TokenError::Unauthorized)?;

        if !constant_time_str_eq(&record.token, token) {
            debug!(user_key = %user_key, "token superseded");
            return Err(TokenError::Unauthorized);
        }
        Ok(record)
    }

    async fn refresh(&self, mut record: SessionRecord) -> Result<(), TokenError> {
        let max_refresh = self.options.max_refresh();
        if max_refresh.is_zero() {
            return Ok(());
        }

        let now = now_millis();
        let elapsed = u128::try_from(record.elapsed_millis(now)).unwrap_or(0);
        if elapsed <= max_refresh.as_millis() {
            return Ok(());
        }

        let cap = self.options.max_refresh_times;
        if cap > 0 && record.refresh_num >= cap {
            return Ok(());
        }

        record.mark_refreshed(now);
        self.store
            .set(&self.options.cache_key(&record.user_key), &record)
            .await
            .map_err(TokenError::cache("refresh session"))?;

        debug!(
            user_key = %record.user_key,
            refresh_num = record.refresh_num,
            "session refreshed"
        );
        Ok(())
    }
}
