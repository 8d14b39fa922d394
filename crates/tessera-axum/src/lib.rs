//! Tessera Axum Integration
//!
//! Axum middleware, extractors and session endpoints for tessera tokens.
//!
//! # Quick Start
//!
//! ```ignore
//! use tessera_axum::{RequireAuth, SessionRoutes};
//! use tessera_core::{InterceptMode, TokenManager, TokenOptions};
//! use axum::{Router, routing::get};
//!
//! async fn profile(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.user_key)
//! }
//!
//! let manager = TokenManager::connect(TokenOptions::default()).await?;
//! let app = SessionRoutes::new(InterceptMode::Global)
//!     .with_auth_paths(["/api"])
//!     .with_login_path("/login")
//!     .with_logout_path("/logout")
//!     .mount(
//!         Router::new().route("/api/profile", get(profile)),
//!         manager,
//!         authenticator,
//!     )?;
//! ```
//!
//! # Extractors
//!
//! - [`RequireAuth`] - Requires a validated session (401 if missing)
//! - [`MaybeAuth`] - Optional session (None if missing)

pub mod context;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod hooks;
pub mod layer;
pub mod routes;

pub use context::{AuthContext, PresentedToken, TokenSource};
pub use error::{AuthError, ErrorResponse};
pub use extract::{take_token, token_from_parts, TOKEN_FIELD};
pub use extractors::{MaybeAuth, RequireAuth};
pub use hooks::{DefaultHooks, SessionHooks};
pub use layer::{AuthLayer, AuthService};
pub use routes::{
    Authenticator, LoginResponse, LoginSubject, MessageResponse, SessionRoutes, SetupError,
};
