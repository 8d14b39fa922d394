//! End-to-end tests for the auth layer and session endpoints

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tessera_axum::{
    AuthError, Authenticator, LoginSubject, MaybeAuth, RequireAuth, SessionHooks, SessionRoutes,
};
use tessera_core::{InterceptMode, TokenManager, TokenOptions};
use tower::ServiceExt;

/// Logs in whoever is named in the body, except "mallory"
struct BodyAuthenticator;

#[async_trait]
impl Authenticator for BodyAuthenticator {
    async fn authenticate(
        &self,
        _headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Option<LoginSubject>, AuthError> {
        let name = String::from_utf8_lossy(&body).trim().to_string();
        if name.is_empty() || name == "mallory" {
            return Ok(None);
        }
        Ok(Some(LoginSubject::new(name).with_data(r#"{"role":"user"}"#)))
    }
}

async fn manager() -> TokenManager {
    let options = TokenOptions::new()
        .with_encrypt_key(b"axum-integration-test-key-000000")
        .with_auth_exclude_paths(["/api/public/*"]);
    TokenManager::connect(options).await.unwrap()
}

async fn whoami(auth: RequireAuth) -> String {
    auth.user_key.clone()
}

async fn greet(auth: MaybeAuth) -> String {
    match auth.0 {
        Some(ctx) => format!("hello {}", ctx.user_key),
        None => "hello guest".to_string(),
    }
}

async fn echo(body: String) -> String {
    body
}

fn protected() -> Router {
    Router::new()
        .route("/api/me", get(whoami))
        .route("/api/echo", post(echo))
        .route("/api/public/greet", get(greet))
        .route("/health", get(|| async { "OK" }))
}

async fn app(mode: InterceptMode) -> Router {
    SessionRoutes::new(mode)
        .with_auth_paths(["/api"])
        .with_login_path("/login")
        .with_logout_path("/logout")
        .with_session_path("/session")
        .mount(protected(), manager().await, Arc::new(BodyAuthenticator))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

async fn login(app: &Router, name: &str) -> String {
    let response = app
        .clone()
        .oneshot(Request::post("/login").body(Body::from(name.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["userKey"], name);
    json["token"].as_str().unwrap().to_string()
}

fn bearer(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = app(InterceptMode::Global).await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "MISSING_PARAMETER");

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_then_access() {
    let app = app(InterceptMode::Global).await;
    let token = login(&app, "alice").await;

    let response = app.clone().oneshot(bearer("/api/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "alice");

    let response = app
        .oneshot(
            Request::get(format!("/api/me?token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_login() {
    let app = app(InterceptMode::Global).await;
    let response = app
        .oneshot(Request::post("/login").body(Body::from("mallory")).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "LOGIN_FAILED");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let app = app(InterceptMode::Global).await;
    let token = login(&app, "alice").await;

    let response = app
        .oneshot(
            Request::get(format!("/api/me?token={token}"))
                .header("Authorization", "Basic abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_AUTHORIZATION");
}

#[tokio::test]
async fn test_stale_and_garbage_tokens() {
    let app = app(InterceptMode::Global).await;
    let stale = login(&app, "alice").await;
    let current = login(&app, "alice").await;

    let response = app.clone().oneshot(bearer("/api/me", &stale)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");

    let response = app.clone().oneshot(bearer("/api/me", "garbage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_TOKEN");

    let response = app.oneshot(bearer("/api/me", &current)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_excluded_path_passes_through() {
    let app = app(InterceptMode::Global).await;
    let response = app
        .oneshot(Request::get("/api/public/greet").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hello guest");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = app(InterceptMode::Global).await;
    let token = login(&app, "alice").await;

    let response = app.clone().oneshot(bearer("/logout", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "logged out");

    let response = app.oneshot(bearer("/api/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_data() {
    let app = app(InterceptMode::Global).await;
    let token = login(&app, "alice").await;

    let response = app.oneshot(bearer("/session", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["userKey"], "alice");
    assert_eq!(json["data"], r#"{"role":"user"}"#);
}

#[tokio::test]
async fn test_form_token_and_body_preserved() {
    let app = app(InterceptMode::Global).await;
    let token = login(&app, "alice").await;
    let form = format!("item=7&token={token}");

    let response = app
        .oneshot(
            Request::post("/api/echo")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, form);
}

#[tokio::test]
async fn test_bind_mode_respects_segments() {
    let app = SessionRoutes::new(InterceptMode::Bind)
        .with_auth_paths(["/api"])
        .with_login_path("/login")
        .with_logout_path("/logout")
        .mount(
            protected().route("/apiary", get(|| async { "bees" })),
            manager().await,
            Arc::new(BodyAuthenticator),
        )
        .unwrap();

    let response = app
        .clone()
        .oneshot(Request::get("/apiary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_mode_lets_session_endpoints_through() {
    let group = Router::new().route("/orders", get(whoami));
    let app = SessionRoutes::new(InterceptMode::Group)
        .with_login_path("/login")
        .with_logout_path("/logout")
        .with_group_prefix("/shop")
        .mount(group, manager().await, Arc::new(BodyAuthenticator))
        .unwrap();

    let response = app
        .clone()
        .oneshot(Request::post("/shop/login").body(Body::from("bob")).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(Request::get("/shop/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(bearer("/shop/orders", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "bob");
}

fn shop_group() -> Router {
    Router::new()
        .route("/orders", get(whoami))
        .route("/public/news", get(greet))
}

async fn shop(prefix: Option<&str>, excludes: &[&str]) -> Router {
    let mut routes = SessionRoutes::new(InterceptMode::Group)
        .with_login_path("/login")
        .with_logout_path("/logout")
        .with_exclude_paths(excludes.iter().copied());
    if let Some(prefix) = prefix {
        routes = routes.with_group_prefix(prefix);
    }
    routes
        .mount(shop_group(), manager().await, Arc::new(BodyAuthenticator))
        .unwrap()
}

async fn get_status(app: &Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_group_prefix_excludes_match_full_path() {
    let app = shop(Some("/shop"), &["/shop/public/*"]).await;

    let response = app
        .clone()
        .oneshot(Request::get("/shop/public/news").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hello guest");

    assert_eq!(get_status(&app, "/shop/orders").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_prefix_ignores_top_level_excludes() {
    let app = shop(Some("/shop"), &["/public/*"]).await;

    assert_eq!(
        get_status(&app, "/shop/public/news").await,
        StatusCode::BAD_REQUEST
    );

    let response = app
        .clone()
        .oneshot(Request::post("/shop/login").body(Body::from("carol")).unwrap())
        .await
        .unwrap();
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app.oneshot(bearer("/shop/public/news", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "hello carol");
}

#[tokio::test]
async fn test_group_without_prefix_excludes() {
    let app = shop(None, &["/public/*"]).await;

    assert_eq!(get_status(&app, "/public/news").await, StatusCode::OK);
    assert_eq!(get_status(&app, "/orders").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bind_mode_excludes() {
    let app = SessionRoutes::new(InterceptMode::Bind)
        .with_auth_paths(["/api"])
        .with_exclude_paths(["/api/open"])
        .with_login_path("/login")
        .with_logout_path("/logout")
        .mount(
            protected().route("/api/open", get(|| async { "open" })),
            manager().await,
            Arc::new(BodyAuthenticator),
        )
        .unwrap();

    // From the manager's options
    assert_eq!(get_status(&app, "/api/public/greet").await, StatusCode::OK);
    assert_eq!(get_status(&app, "/api/open").await, StatusCode::OK);
    assert_eq!(get_status(&app, "/api/me").await, StatusCode::BAD_REQUEST);
}

/// Skips asset paths, answers rejections with 403 and wants logouts confirmed
struct StrictHooks;

#[async_trait]
impl SessionHooks for StrictHooks {
    async fn before_auth(&self, parts: &Parts) -> bool {
        !parts.uri.path().starts_with("/api/assets/")
    }

    fn auth_rejected(&self, err: AuthError) -> Response {
        (StatusCode::FORBIDDEN, err.error_code()).into_response()
    }

    async fn before_logout(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if headers.contains_key("x-confirm") {
            Ok(())
        } else {
            Err(AuthError::Unauthenticated)
        }
    }

    fn logged_out(&self, user_key: &str) -> Response {
        format!("bye {user_key}").into_response()
    }
}

async fn strict_app() -> Router {
    SessionRoutes::new(InterceptMode::Global)
        .with_auth_paths(["/api"])
        .with_login_path("/login")
        .with_logout_path("/logout")
        .with_hooks(Arc::new(StrictHooks))
        .mount(
            protected().route("/api/assets/logo.png", get(|| async { "png" })),
            manager().await,
            Arc::new(BodyAuthenticator),
        )
        .unwrap()
}

#[tokio::test]
async fn test_hooks_shape_auth_check() {
    let app = strict_app().await;

    assert_eq!(get_status(&app, "/api/assets/logo.png").await, StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "MISSING_PARAMETER");
}

#[tokio::test]
async fn test_hooks_shape_logout() {
    let app = strict_app().await;
    let token = login(&app, "alice").await;

    let response = app.clone().oneshot(bearer("/logout", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get_status_with(&app, "/api/me", &token).await, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::get("/logout")
                .header("Authorization", format!("Bearer {token}"))
                .header("x-confirm", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "bye alice");

    assert_eq!(
        get_status_with(&app, "/api/me", &token).await,
        StatusCode::FORBIDDEN
    );
}

async fn get_status_with(app: &Router, uri: &str, token: &str) -> StatusCode {
    app.clone().oneshot(bearer(uri, token)).await.unwrap().status()
}
