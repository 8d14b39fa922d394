//! Configuration for the session API service.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use tessera_core::{CacheMode, InterceptMode, TokenOptions};

/// Session API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Token engine options
    pub tokens: TokenOptions,

    /// Interception mode
    pub mode: InterceptMode,

    /// Auth path prefixes (bind and global modes)
    pub auth_paths: Vec<String>,

    pub login_path: String,
    pub logout_path: String,

    /// Group prefix (group mode)
    pub group_prefix: Option<String>,

    /// Demo accounts, user name to password
    pub users: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server
        let http_port = parse_or(&var, "HTTP_PORT", 8080)?;

        // Token engine
        let mut tokens = TokenOptions::new()
            .with_cache_mode(parse_or(&var, "TESSERA_CACHE_MODE", CacheMode::Memory)?)
            .with_max_refresh_times(parse_or(&var, "TESSERA_MAX_REFRESH_TIMES", 0)?)
            .with_multi_login(parse_or(&var, "TESSERA_MULTI_LOGIN", false)?)
            .with_auth_exclude_paths(list(var("TESSERA_EXCLUDE_PATHS")));

        if let Some(prefix) = var("TESSERA_CACHE_PREFIX") {
            tokens = tokens.with_cache_prefix(prefix);
        }
        if let Some(ms) = var("TESSERA_TIMEOUT_MS") {
            tokens = tokens.with_timeout(millis(&ms, "TESSERA_TIMEOUT_MS")?);
        }
        if let Some(ms) = var("TESSERA_MAX_REFRESH_MS") {
            tokens = tokens.with_max_refresh(millis(&ms, "TESSERA_MAX_REFRESH_MS")?);
        }
        if let Some(delimiter) = var("TESSERA_TOKEN_DELIMITER") {
            tokens = tokens.with_token_delimiter(delimiter);
        }
        if let Some(key) = var("TESSERA_ENCRYPT_KEY") {
            tokens = tokens.with_encrypt_key(key.as_bytes());
        }
        if let Some(url) = var("TESSERA_REDIS_URL") {
            tokens = tokens.with_redis_url(url);
        }
        if let Some(path) = var("TESSERA_SNAPSHOT_PATH") {
            tokens = tokens.with_snapshot_path(path);
        }

        tokens
            .validate()
            .map_err(|e| ConfigError::Tokens(e.to_string()))?;

        // Routes
        let mode = parse_or(&var, "TESSERA_INTERCEPT_MODE", InterceptMode::Global)?;
        let mut auth_paths = list(var("TESSERA_AUTH_PATHS"));
        if auth_paths.is_empty() {
            auth_paths.push("/api".to_string());
        }

        let users = list(var("TESSERA_USERS"))
            .into_iter()
            .map(|entry| {
                entry
                    .split_once(':')
                    .map(|(name, password)| (name.to_string(), password.to_string()))
                    .ok_or(ConfigError::Invalid("TESSERA_USERS"))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            http_port,
            tokens,
            mode,
            auth_paths,
            login_path: var("TESSERA_LOGIN_PATH").unwrap_or_else(|| "/login".to_string()),
            logout_path: var("TESSERA_LOGOUT_PATH").unwrap_or_else(|| "/logout".to_string()),
            group_prefix: var("TESSERA_GROUP_PREFIX"),
            users,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn millis(raw: &str, key: &'static str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::Invalid(key))
}

fn list(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Token options error: {0}")]
    Tokens(String),
}
