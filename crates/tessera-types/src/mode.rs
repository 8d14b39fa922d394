//! Backend and interception mode selectors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which cache backend stores session records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// In-process TTL map, lost on restart
    #[default]
    Memory,
    /// Remote Redis server
    Redis,
    /// In-process map snapshotted to a file after every mutation
    File,
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
            Self::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for CacheMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "cache" | "1" => Ok(Self::Memory),
            "redis" | "2" => Ok(Self::Redis),
            "file" | "3" => Ok(Self::File),
            _ => Err(ModeParseError::Cache(s.to_string())),
        }
    }
}

/// How the auth hook is attached to the host router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterceptMode {
    /// Hook bound only under the configured auth paths
    #[default]
    Bind,
    /// Hook sees every request; auth paths act as a prefix filter
    Global,
    /// Hook attached to a route group; login/logout are exempt
    Group,
}

impl std::fmt::Display for InterceptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
            Self::Global => write!(f, "global"),
            Self::Group => write!(f, "group"),
        }
    }
}

impl std::str::FromStr for InterceptMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "group" | "1" => Ok(Self::Group),
            "bind" | "2" => Ok(Self::Bind),
            "global" | "3" => Ok(Self::Global),
            _ => Err(ModeParseError::Intercept(s.to_string())),
        }
    }
}

/// Error parsing a mode string
#[derive(Debug, Clone, Error)]
pub enum ModeParseError {
    #[error("invalid cache mode: {0}")]
    Cache(String),

    #[error("invalid interception mode: {0}")]
    Intercept(String),
}
