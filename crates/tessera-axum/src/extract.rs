//! Token lookup on incoming requests.
//!
//! Order: `Authorization` header, then the `token` query parameter, then
//! the `token` field of a form-urlencoded body. A present but malformed
//! header is rejected outright.

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Request};

use crate::context::{PresentedToken, TokenSource};
use crate::error::AuthError;

/// Query and form field carrying the token
pub const TOKEN_FIELD: &str = "token";

/// Largest form body buffered for the token lookup
pub const DEFAULT_MAX_FORM_BYTES: usize = 64 * 1024;

const BEARER: &str = "Bearer";

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    if value.is_empty() {
        return Ok(None);
    }
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthorization)?;
    match value.split_once(' ') {
        Some((BEARER, token)) if !token.is_empty() => Ok(Some(token.to_string())),
        _ => Err(AuthError::InvalidAuthorization),
    }
}

fn field_token(encoded: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(key, _)| key == TOKEN_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Look for a token in the header and query string
pub fn token_from_parts(parts: &Parts) -> Result<Option<PresentedToken>, AuthError> {
    if let Some(token) = bearer_token(&parts.headers)? {
        return Ok(Some(PresentedToken {
            token,
            source: TokenSource::BearerHeader,
        }));
    }

    Ok(parts
        .uri
        .query()
        .and_then(|q| field_token(q.as_bytes()))
        .map(|token| PresentedToken {
            token,
            source: TokenSource::Query,
        }))
}

/// Find the request token, buffering a form body if needed.
///
/// The returned request carries the same body bytes the client sent.
pub async fn take_token(
    req: Request<Body>,
    max_form_bytes: usize,
) -> Result<(Request<Body>, PresentedToken), AuthError> {
    let (parts, body) = req.into_parts();

    if let Some(found) = token_from_parts(&parts)? {
        return Ok((Request::from_parts(parts, body), found));
    }
    if !is_form(&parts.headers) {
        return Err(AuthError::MissingToken);
    }

    let bytes = axum::body::to_bytes(body, max_form_bytes)
        .await
        .map_err(|e| AuthError::Body(e.to_string()))?;
    let found = field_token(&bytes).map(|token| PresentedToken {
        token,
        source: TokenSource::Form,
    });
    let req = Request::from_parts(parts, Body::from(bytes));

    found.map(|t| (req, t)).ok_or(AuthError::MissingToken)
}
