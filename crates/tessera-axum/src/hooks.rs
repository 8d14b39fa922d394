//! Customization points around the auth check and logout.
//!
//! Every method has a default matching the built-in behaviour, so an
//! implementation only overrides what it needs.
//!
//! ```ignore
//! struct SkipAssets;
//!
//! #[async_trait]
//! impl SessionHooks for SkipAssets {
//!     async fn before_auth(&self, parts: &Parts) -> bool {
//!         !parts.uri.path().starts_with("/api/assets/")
//!     }
//! }
//! ```

use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::AuthError;
use crate::routes::MessageResponse;

#[async_trait]
pub trait SessionHooks: Send + Sync + 'static {
    /// Runs on every intercepted request before the token lookup.
    /// Returning `false` lets the request through without a session.
    /// Inside a nested group `parts.uri` lacks the group prefix; the full
    /// path is in the `OriginalUri` extension.
    async fn before_auth(&self, _parts: &Parts) -> bool {
        true
    }

    /// Response sent for a rejected request
    fn auth_rejected(&self, err: AuthError) -> Response {
        err.into_response()
    }

    /// Runs before a logout is processed; an error ends the request
    async fn before_logout(&self, _headers: &HeaderMap) -> Result<(), AuthError> {
        Ok(())
    }

    /// Response sent once a session has been destroyed
    fn logged_out(&self, _user_key: &str) -> Response {
        Json(MessageResponse {
            message: "logged out",
        })
        .into_response()
    }
}

/// The built-in behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl SessionHooks for DefaultHooks {}
