//! Tessera Cache - session record storage
//!
//! Every backend implements [`SessionStore`] and stores records as JSON
//! text with a per-entry time-to-live equal to the session timeout.
//!
//! - [`MemoryStore`] - in-process TTL map, lost on restart
//! - [`RedisStore`] - remote Redis server (`SETEX` / `GET` / `DEL`)
//! - [`FileStore`] - in-process map rewritten to a snapshot file after
//!   every mutation and reloaded on startup
//!
//! # Usage
//!
//! ```ignore
//! use tessera_cache::{open, StoreSettings};
//! use tessera_types::CacheMode;
//!
//! let settings = StoreSettings::new(Duration::from_secs(3600));
//! let store = open(CacheMode::Memory, &settings).await?;
//! store.set("Tessera:alice", &record).await?;
//! ```

pub mod error;
pub mod file;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::{open, SessionStore, StoreSettings};
