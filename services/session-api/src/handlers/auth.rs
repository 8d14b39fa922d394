//! Login credential check against a fixed account list

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::Deserialize;
use tessera_axum::{AuthError, Authenticator, LoginSubject};
use tessera_core::constant_time_str_eq;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Accepts the accounts configured in `TESSERA_USERS`
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        _headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Option<LoginSubject>, AuthError> {
        let Ok(req) = serde_json::from_slice::<LoginRequest>(&body) else {
            return Ok(None);
        };

        let accepted = self
            .users
            .get(&req.username)
            .is_some_and(|expected| constant_time_str_eq(expected, &req.password));
        if !accepted {
            return Ok(None);
        }

        let data = serde_json::json!({ "username": req.username }).to_string();
        Ok(Some(LoginSubject::new(req.username).with_data(data)))
    }
}
