//! Tower middleware layer for token authentication.
//!
//! The [`AuthLayer`] decides per request whether a token is required,
//! validates it through the [`TokenManager`] and attaches an
//! [`AuthContext`] for handlers. Rejections never reach the inner service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::{Method, Request};
use axum::response::Response;
use pin_project_lite::pin_project;
use tessera_core::{InterceptMode, PathMatcher, TokenManager};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::context::AuthContext;
use crate::error::AuthError;
use crate::extract::{take_token, DEFAULT_MAX_FORM_BYTES};
use crate::hooks::{DefaultHooks, SessionHooks};

type AuthorizeFuture = Pin<Box<dyn Future<Output = Result<Request<Body>, Response>> + Send>>;

/// Tower layer that enforces token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    manager: TokenManager,
    matcher: Arc<PathMatcher>,
    hooks: Arc<dyn SessionHooks>,
    max_form_bytes: usize,
}

impl AuthLayer {
    /// Create a layer with the given path rules.
    #[must_use]
    pub fn new(manager: TokenManager, matcher: PathMatcher) -> Self {
        Self {
            manager,
            matcher: Arc::new(matcher),
            hooks: Arc::new(DefaultHooks),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
        }
    }

    /// Replace the default auth hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the largest form body buffered while looking for a token.
    #[must_use]
    pub fn with_max_form_bytes(mut self, limit: usize) -> Self {
        self.max_form_bytes = limit;
        self
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            manager: self.manager.clone(),
            matcher: self.matcher.clone(),
            hooks: self.hooks.clone(),
            max_form_bytes: self.max_form_bytes,
        }
    }
}

/// The token authentication service.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    manager: TokenManager,
    matcher: Arc<PathMatcher>,
    hooks: Arc<dyn SessionHooks>,
    max_form_bytes: usize,
}

/// Whether the layer checks a token for `path`
pub(crate) fn intercepts(matcher: &PathMatcher, path: &str) -> bool {
    match matcher.mode() {
        InterceptMode::Bind => matcher.is_bound(path) && matcher.requires_auth(path),
        InterceptMode::Global | InterceptMode::Group => matcher.requires_auth(path),
    }
}

fn audit(method: &Method, path: &str, err: &AuthError) {
    if err.is_internal() {
        return;
    }
    warn!(
        %method,
        path,
        code = err.error_code(),
        reason = %err,
        "request rejected"
    );
}

/// Path as the client sent it, before any `nest` stripped a prefix
fn request_path(req: &Request<Body>) -> String {
    req.extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri().path(), |uri| uri.0.path())
        .to_owned()
}

async fn authorize(
    manager: TokenManager,
    matcher: Arc<PathMatcher>,
    hooks: Arc<dyn SessionHooks>,
    max_form_bytes: usize,
    req: Request<Body>,
) -> Result<Request<Body>, Response> {
    let path = request_path(&req);
    if !intercepts(&matcher, &path) {
        return Ok(req);
    }

    let (parts, body) = req.into_parts();
    if !hooks.before_auth(&parts).await {
        debug!(path = %path, "auth check skipped by hook");
        return Ok(Request::from_parts(parts, body));
    }
    let req = Request::from_parts(parts, body);
    let method = req.method().clone();

    let checked = async {
        let (mut req, presented) = take_token(req, max_form_bytes).await?;
        let user_key = manager.validate(&presented.token).await?;
        debug!(%user_key, source = presented.source.as_str(), "request authorized");
        req.extensions_mut()
            .insert(AuthContext::new(user_key, presented));
        Ok::<_, AuthError>(req)
    }
    .await;

    checked.map_err(|err| {
        audit(&method, &path, &err);
        hooks.auth_rejected(err)
    })
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = AuthFuture<S>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Keep the service that was driven to readiness
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        let check = Box::pin(authorize(
            self.manager.clone(),
            self.matcher.clone(),
            self.hooks.clone(),
            self.max_form_bytes,
            req,
        ));

        AuthFuture {
            state: FutureState::Authorizing {
                check,
                inner: Some(inner),
            },
        }
    }
}

pin_project! {
    /// Future for the auth service.
    pub struct AuthFuture<S>
    where
        S: Service<Request<Body>>,
    {
        #[pin]
        state: FutureState<S>,
    }
}

pin_project! {
    #[project = FutureStateProj]
    enum FutureState<S>
    where
        S: Service<Request<Body>>,
    {
        Authorizing {
            check: AuthorizeFuture,
            inner: Option<S>,
        },
        Calling {
            #[pin]
            future: S::Future,
        },
        Done,
    }
}

impl<S> Future for AuthFuture<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Output = Result<Response, S::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            let this = self.as_mut().project();

            match this.state.project() {
                FutureStateProj::Authorizing { check, inner } => {
                    let outcome = ready!(check.as_mut().poll(cx));
                    let service = inner.take();

                    match (outcome, service) {
                        (Ok(request), Some(mut service)) => {
                            let future = service.call(request);
                            self.set(AuthFuture {
                                state: FutureState::Calling { future },
                            });
                        }
                        (Err(response), _) => {
                            self.set(AuthFuture {
                                state: FutureState::Done,
                            });
                            return Poll::Ready(Ok(response));
                        }
                        (Ok(_), None) => panic!("polled after completion"),
                    }
                }
                FutureStateProj::Calling { future } => {
                    return future.poll(cx);
                }
                FutureStateProj::Done => {
                    panic!("polled after completion");
                }
            }
        }
    }
}
