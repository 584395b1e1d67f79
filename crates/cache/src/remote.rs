//! Remote cache backends over an injected key-value client
//!
//! Connection setup and protocol details belong to the client. These
//! backends only encode values as JSON text and classify failures.

use crate::proxy::{AsyncCacheProxy, CacheProxy};
use async_trait::async_trait;
use runguard_core::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Error reported by a key-value client
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Key-value store reached with blocking round trips
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueClient: Send + Sync {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, ClientError>;

    /// Store `value` under `key`, expiring after `ttl`
    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> std::result::Result<(), ClientError>;
}

/// Key-value store reached through suspension
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AsyncKeyValueClient: Send + Sync {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, ClientError>;

    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<(), ClientError>;
}

fn decode(key: &str, payload: Option<String>) -> Result<Option<Value>> {
    payload
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|e| Error::cache_corrupted(key, e.to_string()))
        })
        .transpose()
}

fn encode(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::json("failed to encode cache value", e))
}

/// Blocking backend over a [`KeyValueClient`]
pub struct RemoteCache<C: ?Sized> {
    client: Arc<C>,
    name: String,
}

impl<C: KeyValueClient + ?Sized> RemoteCache<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_name(client, "remote")
    }

    pub fn with_name(client: Arc<C>, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for RemoteCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCache").field("name", &self.name).finish()
    }
}

impl<C: KeyValueClient + ?Sized> CacheProxy for RemoteCache<C> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let payload = self
            .client
            .get(key)
            .map_err(|e| Error::cache_unavailable_with_source(self.name.as_str(), e))?;
        decode(key, payload)
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let payload = encode(value)?;
        self.client
            .set_ex(key, &payload, ttl)
            .map_err(|e| Error::cache_unavailable_with_source(self.name.as_str(), e))
    }

    fn backend(&self) -> &str {
        &self.name
    }
}

/// Suspending backend over an [`AsyncKeyValueClient`]
pub struct AsyncRemoteCache<C: ?Sized> {
    client: Arc<C>,
    name: String,
}

impl<C: AsyncKeyValueClient + ?Sized> AsyncRemoteCache<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_name(client, "remote-async")
    }

    pub fn with_name(client: Arc<C>, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for AsyncRemoteCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRemoteCache")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<C: AsyncKeyValueClient + ?Sized> AsyncCacheProxy for AsyncRemoteCache<C> {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let payload = self
            .client
            .get(key)
            .await
            .map_err(|e| Error::cache_unavailable_with_source(self.name.as_str(), e))?;
        decode(key, payload)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let payload = encode(value)?;
        self.client
            .set_ex(key, &payload, ttl)
            .await
            .map_err(|e| Error::cache_unavailable_with_source(self.name.as_str(), e))
    }

    fn backend(&self) -> &str {
        &self.name
    }
}
