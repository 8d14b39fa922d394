//! Tessera Core - token lifecycle engine
//!
//! Issues opaque encrypted session tokens bound to a user key, stores the
//! session state in a pluggable [`SessionStore`], validates tokens on every
//! protected request and extends session lifetime on use.
//!
//! - [`codec`] - user key <-> opaque token transform
//! - [`token`] - generate / validate / get / destroy orchestration
//! - [`path`] - decides which request paths need a token
//! - [`config`] - options with defaults and validation

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod path;
pub mod token;

pub use codec::{AesTokenCodec, TokenCodec};
pub use config::TokenOptions;
pub use crypto::{constant_time_str_eq, random_salt};
pub use error::{CodecError, ConfigError, TokenError};
pub use path::{is_excluded, PathMatcher};
pub use token::{SessionInfo, TokenManager};

pub use tessera_cache::SessionStore;
pub use tessera_types::{CacheMode, InterceptMode, SessionRecord};
