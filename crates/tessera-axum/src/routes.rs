//! Login, logout and session-data endpoints, and their wiring into a
//! router for each interception mode.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use axum::routing::{any, post};
use axum::{Json, Router};
use serde::Serialize;
use tessera_core::{InterceptMode, PathMatcher, SessionInfo, TokenManager};
use tracing::{info, warn};

use crate::error::AuthError;
use crate::extract::{take_token, DEFAULT_MAX_FORM_BYTES};
use crate::hooks::{DefaultHooks, SessionHooks};
use crate::layer::AuthLayer;

/// Identity established by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSubject {
    pub user_key: String,
    /// Opaque payload stored with the session
    pub data: Option<String>,
}

impl LoginSubject {
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Checks login credentials. Supplied by the host application.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Return the subject to log in, or `None` to reject the credentials
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Option<LoginSubject>, AuthError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_key: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Clone)]
struct SessionState {
    manager: TokenManager,
    authenticator: Arc<dyn Authenticator>,
    hooks: Arc<dyn SessionHooks>,
    max_form_bytes: usize,
}

async fn login(
    State(state): State<SessionState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LoginResponse>, AuthError> {
    let Some(subject) = state.authenticator.authenticate(&headers, body).await? else {
        warn!("login rejected");
        return Err(AuthError::LoginRejected);
    };

    let token = state.manager.generate(&subject.user_key, subject.data).await?;
    info!(user_key = %subject.user_key, "login");

    Ok(Json(LoginResponse {
        user_key: subject.user_key,
        token,
    }))
}

async fn logout(
    State(state): State<SessionState>,
    req: Request<Body>,
) -> Result<Response, AuthError> {
    state.hooks.before_logout(req.headers()).await?;

    let (_, presented) = take_token(req, state.max_form_bytes).await?;
    let user_key = state.manager.destroy_by_token(&presented.token).await?;
    info!(%user_key, "logout");

    Ok(state.hooks.logged_out(&user_key))
}

async fn session_data(
    State(state): State<SessionState>,
    req: Request<Body>,
) -> Result<Json<SessionInfo>, AuthError> {
    let (_, presented) = take_token(req, state.max_form_bytes).await?;
    let info = state.manager.get_by_token(&presented.token).await?;
    Ok(Json(info))
}

/// Invalid session route setup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("{0} not set")]
    NotSet(&'static str),

    #[error("{field} must start with '/': {value}")]
    InvalidPath { field: &'static str, value: String },
}

/// Mounts the session endpoints and the auth layer.
///
/// - Global: the layer covers the whole router; only paths under an auth
///   path are checked.
/// - Bind: the layer only intercepts paths at or below an auth path.
/// - Group: the layer covers one route group; its login and logout
///   endpoints are always let through.
#[derive(Clone)]
pub struct SessionRoutes {
    mode: InterceptMode,
    auth_paths: Vec<String>,
    exclude_paths: Vec<String>,
    login_path: String,
    logout_path: String,
    session_path: Option<String>,
    group_prefix: Option<String>,
    hooks: Arc<dyn SessionHooks>,
    max_form_bytes: usize,
}

impl std::fmt::Debug for SessionRoutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRoutes")
            .field("mode", &self.mode)
            .field("auth_paths", &self.auth_paths)
            .field("exclude_paths", &self.exclude_paths)
            .field("login_path", &self.login_path)
            .field("logout_path", &self.logout_path)
            .field("session_path", &self.session_path)
            .field("group_prefix", &self.group_prefix)
            .finish_non_exhaustive()
    }
}

impl SessionRoutes {
    pub fn new(mode: InterceptMode) -> Self {
        Self {
            mode,
            auth_paths: Vec::new(),
            exclude_paths: Vec::new(),
            login_path: String::new(),
            logout_path: String::new(),
            session_path: None,
            group_prefix: None,
            hooks: Arc::new(DefaultHooks),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
        }
    }

    #[must_use]
    pub fn with_auth_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Extra exclude rules, added to the manager's configured ones
    #[must_use]
    pub fn with_exclude_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    /// Serve the current session's data at `path`
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Nest the group under `prefix` (group mode only)
    #[must_use]
    pub fn with_group_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.group_prefix = Some(prefix.into());
        self
    }

    /// Customize the auth check and the logout endpoint
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_max_form_bytes(mut self, limit: usize) -> Self {
        self.max_form_bytes = limit;
        self
    }

    pub fn mode(&self) -> InterceptMode {
        self.mode
    }

    /// Check the route setup before mounting
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.login_path.is_empty() {
            return Err(SetupError::NotSet("login_path"));
        }
        if self.logout_path.is_empty() {
            return Err(SetupError::NotSet("logout_path"));
        }
        if self.mode != InterceptMode::Group && self.auth_paths.is_empty() {
            return Err(SetupError::NotSet("auth_paths"));
        }

        let mut paths = vec![
            ("login_path", &self.login_path),
            ("logout_path", &self.logout_path),
        ];
        if let Some(path) = &self.session_path {
            paths.push(("session_path", path));
        }
        if let Some(prefix) = &self.group_prefix {
            paths.push(("group_prefix", prefix));
        }
        for (field, value) in paths {
            if !value.starts_with('/') {
                return Err(SetupError::InvalidPath {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    fn matcher(&self, manager: &TokenManager) -> PathMatcher {
        let excludes = manager
            .options()
            .auth_exclude_paths
            .iter()
            .chain(&self.exclude_paths)
            .cloned()
            .collect::<Vec<_>>();

        let matcher = PathMatcher::new(self.mode).with_exclude_paths(excludes);
        match self.mode {
            InterceptMode::Group => {
                matcher.with_session_endpoints(self.login_path.clone(), self.logout_path.clone())
            }
            InterceptMode::Bind | InterceptMode::Global => {
                matcher.with_auth_paths(self.auth_paths.clone())
            }
        }
    }

    /// Add the session endpoints to `protected` and wrap it in the auth
    /// layer.
    pub fn mount(
        self,
        protected: Router,
        manager: TokenManager,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Router, SetupError> {
        self.validate()?;

        let layer = AuthLayer::new(manager.clone(), self.matcher(&manager))
            .with_hooks(self.hooks.clone())
            .with_max_form_bytes(self.max_form_bytes);

        let state = SessionState {
            manager,
            authenticator,
            hooks: self.hooks.clone(),
            max_form_bytes: self.max_form_bytes,
        };
        let mut endpoints = Router::new()
            .route(&self.login_path, post(login))
            .route(&self.logout_path, any(logout));
        if let Some(path) = &self.session_path {
            endpoints = endpoints.route(path, any(session_data));
        }

        let app = protected.merge(endpoints.with_state(state)).layer(layer);

        info!(
            mode = %self.mode,
            login = %self.login_path,
            logout = %self.logout_path,
            auth_paths = ?self.auth_paths,
            "session routes mounted"
        );

        Ok(match (self.mode, self.group_prefix.as_deref()) {
            (InterceptMode::Group, Some(prefix)) if prefix != "/" => Router::new().nest(prefix, app),
            _ => app,
        })
    }
}
