//! Token engine errors

use tessera_cache::CacheError;
use thiserror::Error;

/// Errors from encoding or decoding a token
#[derive(Error, Debug)]
pub enum CodecError {
    /// Required input string was empty
    #[error("{0} is empty")]
    Empty(&'static str),

    /// Encryption key has a length the cipher cannot use
    #[error("encryption key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Token is not valid base64 or fails authenticated decryption
    #[error("token decode error: {0}")]
    Decode(&'static str),

    /// Decrypted plaintext does not have the `userKey<delim>salt` shape
    #[error("malformed token payload")]
    Malformed,

    /// Cipher refused to encrypt
    #[error("token encrypt error")]
    Encrypt,
}

/// Invalid token options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Errors raised by the token manager.
///
/// Variants are kept distinct so the HTTP boundary can choose status
/// codes and log levels per case. "No session" and "stale token" both map
/// to [`TokenError::Unauthorized`] so responses never reveal whether a
/// user key has ever had a session.
#[derive(Error, Debug)]
pub enum TokenError {
    /// A required identity or token was empty
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Token could not be decoded
    #[error("invalid token: {0}")]
    InvalidToken(#[source] CodecError),

    /// No live session, or the token is not the session's current token
    #[error("unauthorized")]
    Unauthorized,

    /// Cache backend failure
    #[error("{operation} failed: {source}")]
    Cache {
        operation: &'static str,
        #[source]
        source: CacheError,
    },

    /// Codec failure not caused by caller input
    #[error("{operation} failed: {source}")]
    Codec {
        operation: &'static str,
        #[source]
        source: CodecError,
    },

    /// Options rejected at construction
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl TokenError {
    pub(crate) fn cache(operation: &'static str) -> impl FnOnce(CacheError) -> Self {
        move |source| Self::Cache { operation, source }
    }

    /// Map a decode failure of caller input
    pub(crate) fn from_decode(err: CodecError) -> Self {
        match err {
            CodecError::Empty(what) => Self::MissingParameter(what),
            other => Self::InvalidToken(other),
        }
    }

    /// Map an encode failure; only empty input is the caller's fault
    pub(crate) fn from_encode(err: CodecError) -> Self {
        match err {
            CodecError::Empty(what) => Self::MissingParameter(what),
            other => Self::Codec {
                operation: "encode token",
                source: other,
            },
        }
    }

    /// Whether this failure is on the server side rather than the caller's
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Cache { .. } | Self::Codec { .. } | Self::Configuration(_)
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter(_) => 400,
            Self::InvalidToken(_) | Self::Unauthorized => 401,
            Self::Cache { .. } | Self::Codec { .. } | Self::Configuration(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Cache { .. } | Self::Codec { .. } | Self::Configuration(_) => "INTERNAL_ERROR",
        }
    }
}
