//! Uniform get/set contract over cache backends
//!
//! Values cross the contract as JSON. A backend that cannot be reached
//! reports [`Error::CacheUnavailable`], which memoization treats as a miss.
//! A backend that returns an undecodable payload reports
//! [`Error::CacheCorrupted`], which is propagated.
//!
//! [`Error::CacheUnavailable`]: runguard_core::Error::CacheUnavailable
//! [`Error::CacheCorrupted`]: runguard_core::Error::CacheCorrupted

use async_trait::async_trait;
use runguard_core::{CallKind, Result};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Cache backend reached with blocking calls
pub trait CacheProxy: Send + Sync + Debug {
    /// Fetch the value stored under `key`, `None` when absent or expired
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key` for `ttl`
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Backend name for logs and errors
    fn backend(&self) -> &str;

    /// Whether calls complete without I/O, so a suspending caller may use it directly
    fn is_local(&self) -> bool {
        false
    }
}

/// Cache backend reached through suspension
#[async_trait]
pub trait AsyncCacheProxy: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    fn backend(&self) -> &str;
}

/// A local blocking backend seen through the suspending contract
#[derive(Debug)]
pub(crate) struct LocalAsync(pub(crate) Arc<dyn CacheProxy>);

#[async_trait]
impl AsyncCacheProxy for LocalAsync {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.0.get(key)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.0.set(key, value, ttl)
    }

    fn backend(&self) -> &str {
        self.0.backend()
    }
}

/// Backend handle injected into memoization
#[derive(Debug, Clone)]
pub enum CacheBackend {
    Blocking(Arc<dyn CacheProxy>),
    Suspending(Arc<dyn AsyncCacheProxy>),
}

impl CacheBackend {
    pub fn blocking(proxy: impl CacheProxy + 'static) -> Self {
        CacheBackend::Blocking(Arc::new(proxy))
    }

    pub fn suspending(proxy: impl AsyncCacheProxy + 'static) -> Self {
        CacheBackend::Suspending(Arc::new(proxy))
    }

    pub fn kind(&self) -> CallKind {
        match self {
            CacheBackend::Blocking(_) => CallKind::Blocking,
            CacheBackend::Suspending(_) => CallKind::Suspending,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CacheBackend::Blocking(proxy) => proxy.backend(),
            CacheBackend::Suspending(proxy) => proxy.backend(),
        }
    }

    pub fn is_local(&self) -> bool {
        match self {
            CacheBackend::Blocking(proxy) => proxy.is_local(),
            CacheBackend::Suspending(_) => false,
        }
    }

    /// Whether a unit of `kind` can use this backend without mixing scheduling models
    pub fn supports(&self, kind: CallKind) -> bool {
        match (kind, self) {
            (CallKind::Blocking, CacheBackend::Blocking(_)) => true,
            (CallKind::Blocking, CacheBackend::Suspending(_)) => false,
            (CallKind::Suspending, CacheBackend::Suspending(_)) => true,
            (CallKind::Suspending, CacheBackend::Blocking(proxy)) => proxy.is_local(),
        }
    }
}
