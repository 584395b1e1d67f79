//! Memoization and cache backends for runguard
//!
//! - **`proxy`**: the [`CacheProxy`] / [`AsyncCacheProxy`] contract and the
//!   [`CacheBackend`] handle memoization is given
//! - **`memory`**: an in-process, capacity-bounded backend with per-entry TTL
//! - **`remote`**: backends over an injected key-value client, blocking or
//!   suspending
//! - **`keys`**: deterministic key derivation from call identity and arguments
//! - **`memoize`**: the wrapper itself

mod flight;
pub mod keys;
pub mod memoize;
pub mod memory;
pub mod proxy;
pub mod remote;

pub use keys::{derive_key, CacheKey};
pub use memoize::{memoize, MemoizeOptions};
pub use memory::MemoryCache;
pub use proxy::{AsyncCacheProxy, CacheBackend, CacheProxy};
pub use remote::{AsyncKeyValueClient, AsyncRemoteCache, ClientError, KeyValueClient, RemoteCache};
