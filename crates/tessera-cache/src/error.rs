//! Cache errors

use thiserror::Error;

/// Errors raised by session store backends
#[derive(Error, Debug)]
pub enum CacheError {
    /// Attempt to store a record with neither identity nor token
    #[error("cache value is empty")]
    EmptyRecord,

    /// Stored payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis command or connection failure
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// Snapshot file could not be read or written
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
