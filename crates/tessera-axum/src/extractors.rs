//! Axum extractors for the validated session.
//!
//! # Usage
//!
//! ```ignore
//! use tessera_axum::{MaybeAuth, RequireAuth};
//!
//! async fn protected(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.user_key)
//! }
//!
//! async fn maybe(auth: MaybeAuth) -> String {
//!     match auth.0 {
//!         Some(ctx) => format!("Hello, {}!", ctx.user_key),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use std::ops::Deref;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::AuthContext;
use crate::error::AuthError;

/// Extractor that requires a validated session.
///
/// Rejects with 401 when the auth layer did not attach a context, for
/// example on a route the layer does not intercept.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Self)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extractor for an optional session.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl Deref for MaybeAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthContext>().cloned()))
    }
}
