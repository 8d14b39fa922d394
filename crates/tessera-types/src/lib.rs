//! Tessera Types - Shared domain types
//!
//! Types shared between the token engine, the cache backends and the
//! HTTP adapter:
//! - The persisted session record
//! - Cache backend and interception mode selectors

pub mod mode;
pub mod session;

pub use mode::*;
pub use session::*;
