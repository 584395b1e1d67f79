//! Memoization wrapper
//!
//! Results are stored through a [`CacheBackend`] under a key derived from
//! the call identity and arguments. Lookups that fail because the backend is
//! unreachable count as misses and the call is computed. A stored payload
//! that cannot be decoded is an error. Failed writes are logged and never
//! fail the call.
//!
//! Without single flight, concurrent callers that miss on the same key all
//! compute and all write, last write wins.

use crate::flight::SingleFlight;
use crate::keys::{derive_key, CacheKey};
use crate::proxy::{AsyncCacheProxy, CacheBackend, CacheProxy, LocalAsync};
use futures::FutureExt;
use runguard_config::CacheSettings;
use runguard_core::{
    BlockingFn, CallArgs, CallIdentity, Error, ExecError, Result, SuspendingFn, UnitOfWork,
    DEFAULT_CACHE_TTL, DEFAULT_KEY_PREFIX,
};
use runguard_utils::tracing::{cache_event, call_span, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Options for [`memoize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoizeOptions {
    /// Namespace for derived keys
    pub key_prefix: String,
    /// Lifetime of a stored result
    pub ttl: Duration,
    /// Fixed key used verbatim for every call instead of a derived one
    pub key: Option<String>,
    /// Allow at most one concurrent computation per key
    pub single_flight: bool,
}

impl Default for MemoizeOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: DEFAULT_CACHE_TTL,
            key: None,
            single_flight: false,
        }
    }
}

impl MemoizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            key_prefix: settings.key_prefix.clone(),
            ttl: settings.ttl(),
            key: None,
            single_flight: settings.single_flight,
        }
    }

    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(Error::configuration("memoize ttl must be greater than zero"));
        }
        match &self.key {
            Some(key) if key.is_empty() => {
                Err(Error::configuration("memoize fixed key must not be empty"))
            }
            None if self.key_prefix.is_empty() => {
                Err(Error::configuration("memoize key_prefix must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Wrap `unit` so results are served from `backend` while fresh.
///
/// The returned unit has the same kind as `unit`. A blocking unit needs a
/// blocking backend. A suspending unit takes a suspending backend or a local
/// blocking one such as [`MemoryCache`](crate::MemoryCache); anything else
/// is rejected here rather than on the first call.
///
/// ```no_run
/// use runguard_cache::{memoize, CacheBackend, MemoizeOptions, MemoryCache};
/// use runguard_core::{call_identity, CallArgs, UnitOfWork};
///
/// # fn main() -> runguard_core::Result<()> {
/// let lookup: UnitOfWork<CallArgs, String, String> =
///     UnitOfWork::blocking(|args: CallArgs| Ok(format!("user {}", args.render_positional())));
///
/// let cached = memoize(
///     lookup,
///     call_identity!("lookup"),
///     CacheBackend::blocking(MemoryCache::new(128)?),
///     MemoizeOptions::new(),
/// )?;
/// # let _ = cached;
/// # Ok(())
/// # }
/// ```
pub fn memoize<T, E>(
    unit: UnitOfWork<CallArgs, T, E>,
    identity: CallIdentity,
    backend: CacheBackend,
    options: MemoizeOptions,
) -> Result<UnitOfWork<CallArgs, T, E>>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    E: Send + 'static,
{
    options.validate()?;

    match (unit, backend) {
        (UnitOfWork::Blocking(f), CacheBackend::Blocking(proxy)) => {
            let memo: Arc<Memo<parking_lot::Mutex<()>>> = Arc::new(Memo::new(identity, options));
            Ok(UnitOfWork::from_blocking(move |args: CallArgs| {
                memo.call_blocking(proxy.as_ref(), &f, args)
            }))
        }
        (UnitOfWork::Blocking(_), CacheBackend::Suspending(proxy)) => {
            Err(Error::configuration(format!(
                "blocking function {identity} cannot use suspending cache backend '{}'",
                proxy.backend()
            )))
        }
        (UnitOfWork::Suspending(f), backend) => {
            let proxy: Arc<dyn AsyncCacheProxy> = match backend {
                CacheBackend::Suspending(proxy) => proxy,
                CacheBackend::Blocking(proxy) if proxy.is_local() => Arc::new(LocalAsync(proxy)),
                CacheBackend::Blocking(proxy) => {
                    return Err(Error::configuration(format!(
                        "suspending function {identity} cannot use blocking cache backend '{}'",
                        proxy.backend()
                    )))
                }
            };
            let memo: Arc<Memo<tokio::sync::Mutex<()>>> = Arc::new(Memo::new(identity, options));
            Ok(UnitOfWork::from_suspending(move |args: CallArgs| {
                let memo = Arc::clone(&memo);
                let proxy = Arc::clone(&proxy);
                let f = Arc::clone(&f);
                let span = call_span(&memo.label);
                async move { memo.call(proxy.as_ref(), &f, args).await }
                    .instrument(span)
                    .boxed()
            }))
        }
    }
}

struct Memo<L> {
    identity: CallIdentity,
    label: String,
    options: MemoizeOptions,
    flights: Option<SingleFlight<L>>,
}

impl<L: Default> Memo<L> {
    fn new(identity: CallIdentity, options: MemoizeOptions) -> Self {
        Self {
            label: identity.to_string(),
            flights: options.single_flight.then(SingleFlight::new),
            identity,
            options,
        }
    }

    fn key(&self, args: &CallArgs) -> CacheKey {
        match &self.options.key {
            Some(key) => CacheKey::fixed(key.clone()),
            None => derive_key(&self.options.key_prefix, &self.identity, args),
        }
    }
}

impl Memo<parking_lot::Mutex<()>> {
    fn call_blocking<T, E>(
        &self,
        proxy: &dyn CacheProxy,
        f: &BlockingFn<CallArgs, T, E>,
        args: CallArgs,
    ) -> std::result::Result<T, ExecError<E>>
    where
        T: Serialize + DeserializeOwned,
    {
        let _entered = call_span(&self.label).entered();
        let key = self.key(&args);

        if let Some(hit) = lookup(&key, proxy.backend(), proxy.get(key.as_str()))? {
            return Ok(hit);
        }

        let Some(flights) = &self.flights else {
            return self.compute_blocking(proxy, f, args, &key);
        };

        let ticket = flights.ticket(key.as_str());
        let _held = ticket.lock().lock();
        // Another holder may have stored the result while this one waited
        let stored = lookup(&key, proxy.backend(), proxy.get(key.as_str()))?;
        match stored {
            Some(hit) => Ok(hit),
            None => self.compute_blocking(proxy, f, args, &key),
        }
    }

    fn compute_blocking<T, E>(
        &self,
        proxy: &dyn CacheProxy,
        f: &BlockingFn<CallArgs, T, E>,
        args: CallArgs,
        key: &CacheKey,
    ) -> std::result::Result<T, ExecError<E>>
    where
        T: Serialize,
    {
        let result = f(args)?;
        if let Some(value) = encode(key, &result) {
            let written = proxy.set(key.as_str(), &value, self.options.ttl);
            settle_write(key, proxy.backend(), written);
        }
        Ok(result)
    }
}

impl Memo<tokio::sync::Mutex<()>> {
    async fn call<T, E>(
        &self,
        proxy: &dyn AsyncCacheProxy,
        f: &SuspendingFn<CallArgs, T, E>,
        args: CallArgs,
    ) -> std::result::Result<T, ExecError<E>>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        let key = self.key(&args);

        if let Some(hit) = lookup(&key, proxy.backend(), proxy.get(key.as_str()).await)? {
            return Ok(hit);
        }

        let Some(flights) = &self.flights else {
            return self.compute(proxy, f, args, &key).await;
        };

        let ticket = flights.ticket(key.as_str());
        let _held = ticket.lock().lock().await;
        let stored = lookup(&key, proxy.backend(), proxy.get(key.as_str()).await)?;
        match stored {
            Some(hit) => Ok(hit),
            None => self.compute(proxy, f, args, &key).await,
        }
    }

    async fn compute<T, E>(
        &self,
        proxy: &dyn AsyncCacheProxy,
        f: &SuspendingFn<CallArgs, T, E>,
        args: CallArgs,
        key: &CacheKey,
    ) -> std::result::Result<T, ExecError<E>>
    where
        T: Serialize + Send,
    {
        let result = f(args).await?;
        if let Some(value) = encode(key, &result) {
            let written = proxy.set(key.as_str(), &value, self.options.ttl).await;
            settle_write(key, proxy.backend(), written);
        }
        Ok(result)
    }
}

/// Turn a backend read into a decoded hit, a miss, or an error
fn lookup<T: DeserializeOwned>(
    key: &CacheKey,
    backend: &str,
    read: Result<Option<Value>>,
) -> Result<Option<T>> {
    match read {
        Ok(Some(value)) => {
            cache_event(key.as_str(), true);
            serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::cache_corrupted(key.as_str(), e.to_string()))
        }
        Ok(None) => {
            cache_event(key.as_str(), false);
            Ok(None)
        }
        Err(err) if err.is_cache_unavailable() => {
            warn!(key = %key, backend = %backend, error = %err, "cache read failed, computing");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn encode<T: Serialize>(key: &CacheKey, result: &T) -> Option<Value> {
    match serde_json::to_value(result) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key = %key, error = %err, "result is not JSON-representable, not cached");
            None
        }
    }
}

fn settle_write(key: &CacheKey, backend: &str, written: Result<()>) {
    if let Err(err) = written {
        warn!(key = %key, backend = %backend, error = %err, "cache write failed");
    }
}
