//! Builder that stacks wrappers over one unit of work

use runguard_cache::{memoize, CacheBackend, MemoizeOptions};
use runguard_config::ControlConfig;
use runguard_core::{CallArgs, CallIdentity, CallKind, Result, UnitOfWork};
use runguard_utils::resilience::{retry, timeout};
use runguard_utils::{run_on_executor, synchronized, timed, RetryPolicy, TimeoutPolicy, WorkerPool};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Wraps a [`UnitOfWork`] layer by layer.
///
/// Each method wraps everything applied so far, so the last call is the
/// outermost layer. `timeout` followed by `retry` bounds every attempt,
/// while `retry` followed by `timeout` bounds the whole retry loop.
pub struct Control<A, T, E> {
    unit: UnitOfWork<A, T, E>,
}

impl<A, T, E> Control<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new(unit: UnitOfWork<A, T, E>) -> Self {
        Self { unit }
    }

    /// Wrap with configured layers: a per-attempt deadline when one is set,
    /// then retries when more than one attempt is allowed
    pub fn from_config(unit: UnitOfWork<A, T, E>, config: &ControlConfig) -> Result<Self>
    where
        A: Clone,
        E: fmt::Display,
    {
        let mut control = Self::new(unit);
        if let Some(policy) = TimeoutPolicy::from_settings(&config.timeout)? {
            let policy = match config.offload.max_workers {
                Some(_) => policy.with_pool(WorkerPool::from_settings(&config.offload)?),
                None => policy,
            };
            control = control.timeout(policy);
        }
        if config.retry.max_attempts > 1 {
            control = control.retry(RetryPolicy::from_settings(&config.retry)?);
        }
        Ok(control)
    }

    #[must_use]
    pub fn retry(self, policy: RetryPolicy<E>) -> Self
    where
        A: Clone,
        E: fmt::Display,
    {
        Self::new(retry::wrap(self.unit, policy))
    }

    #[must_use]
    pub fn timeout(self, policy: TimeoutPolicy) -> Self {
        Self::new(timeout::wrap(self.unit, policy))
    }

    #[must_use]
    pub fn timed(self, label: impl Into<String>) -> Self {
        Self::new(timed(label, self.unit))
    }

    #[must_use]
    pub fn synchronized(self) -> Self {
        Self::new(synchronized(self.unit))
    }

    /// Run blocking work on `pool`, or the shared pool, behind a suspending unit
    #[must_use]
    pub fn on_executor(self, pool: Option<Arc<WorkerPool>>) -> Self {
        Self::new(run_on_executor(self.unit, pool))
    }

    pub fn kind(&self) -> CallKind {
        self.unit.kind()
    }

    pub fn build(self) -> UnitOfWork<A, T, E> {
        self.unit
    }
}

impl<T, E> Control<CallArgs, T, E>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    E: Send + 'static,
{
    /// Serve results from `backend` while fresh
    pub fn memoize(
        self,
        identity: CallIdentity,
        backend: CacheBackend,
        options: MemoizeOptions,
    ) -> Result<Self> {
        memoize(self.unit, identity, backend, options).map(Self::new)
    }
}

impl<A, T, E> From<UnitOfWork<A, T, E>> for Control<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn from(unit: UnitOfWork<A, T, E>) -> Self {
        Self::new(unit)
    }
}

impl<A, T, E> fmt::Debug for Control<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control").field("unit", &self.unit).finish()
    }
}
