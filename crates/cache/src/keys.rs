//! Cache key derivation

use runguard_core::{CallArgs, CallIdentity};
use sha2::{Digest, Sha256};
use std::fmt;

/// Key a memoized result is stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Use `key` verbatim, bypassing derivation and prefixing
    pub fn fixed(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the key for one call.
///
/// The digest covers the identity and the rendered arguments, so the key is
/// stable across processes. Keyword arguments are rendered in sorted order
/// and never depend on the order they were supplied in.
///
/// ```
/// use runguard_cache::derive_key;
/// use runguard_core::{CallArgs, CallIdentity};
///
/// let identity = CallIdentity::new("users", "load");
/// let key = derive_key("app", &identity, &CallArgs::new().arg(7));
/// assert!(key.as_str().starts_with("app:users:load:"));
/// ```
pub fn derive_key(prefix: &str, identity: &CallIdentity, args: &CallArgs) -> CacheKey {
    let material = format!(
        "{}:{}:{}:{}",
        identity.module(),
        identity.name(),
        args.render_positional(),
        args.render_keyword()
    );
    let digest = hex::encode(Sha256::digest(material.as_bytes()));
    CacheKey(format!(
        "{prefix}:{}:{}:{digest}",
        identity.module(),
        identity.name()
    ))
}
