//! Authentication context types.
//!
//! The [`AuthContext`] is inserted into request extensions once a token has
//! been validated, and read back by the extractors.

/// Where the presented token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `Authorization: Bearer <token>` header.
    BearerHeader,
    /// `token` query parameter.
    Query,
    /// `token` field of a form-urlencoded body.
    Form,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BearerHeader => "header",
            Self::Query => "query",
            Self::Form => "form",
        }
    }
}

/// A token taken from a request, not yet validated.
#[derive(Clone, PartialEq, Eq)]
pub struct PresentedToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for PresentedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentedToken")
            .field("token", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Validated session attached to a request.
#[derive(Clone)]
pub struct AuthContext {
    /// The authenticated user key.
    pub user_key: String,
    /// The token that was validated.
    pub token: String,
    /// Where the token came from.
    pub source: TokenSource,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_key", &self.user_key)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    #[must_use]
    pub fn new(user_key: impl Into<String>, presented: PresentedToken) -> Self {
        Self {
            user_key: user_key.into(),
            token: presented.token,
            source: presented.source,
        }
    }
}
