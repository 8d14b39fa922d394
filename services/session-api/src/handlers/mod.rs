//! HTTP handlers

mod auth;
mod health;
mod profile;

pub use auth::StaticAuthenticator;
pub use health::health;
pub use profile::me;
