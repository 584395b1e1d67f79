//! Retry and timeout policies, fixed at wrap time

use crate::pool::WorkerPool;
use runguard_config::{RetrySettings, TimeoutSettings};
use runguard_core::{
    constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY},
    CallKind, Error, ExecError, Result,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which failures trigger another attempt
pub enum RetryOn<E> {
    /// Every failure
    All,
    /// Only failures of the wrapped unit itself
    Failures,
    /// Only deadline expiry of an inner timeout guard
    Timeouts,
    /// Business failures accepted by the predicate
    Failure(Arc<dyn Fn(&E) -> bool + Send + Sync>),
    /// Any failure accepted by the predicate
    Custom(Arc<dyn Fn(&ExecError<E>) -> bool + Send + Sync>),
}

impl<E> RetryOn<E> {
    /// Retry business failures matching `predicate`
    pub fn failure<P>(predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        RetryOn::Failure(Arc::new(predicate))
    }

    /// Retry any failure matching `predicate`
    pub fn custom<P>(predicate: P) -> Self
    where
        P: Fn(&ExecError<E>) -> bool + Send + Sync + 'static,
    {
        RetryOn::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, error: &ExecError<E>) -> bool {
        match self {
            RetryOn::All => true,
            RetryOn::Failures => error.is_failure(),
            RetryOn::Timeouts => error.is_timeout(),
            RetryOn::Failure(predicate) => match error {
                ExecError::Failed(err) => predicate(err),
                _ => false,
            },
            RetryOn::Custom(predicate) => predicate(error),
        }
    }
}

impl<E> Clone for RetryOn<E> {
    fn clone(&self) -> Self {
        match self {
            RetryOn::All => RetryOn::All,
            RetryOn::Failures => RetryOn::Failures,
            RetryOn::Timeouts => RetryOn::Timeouts,
            RetryOn::Failure(predicate) => RetryOn::Failure(Arc::clone(predicate)),
            RetryOn::Custom(predicate) => RetryOn::Custom(Arc::clone(predicate)),
        }
    }
}

impl<E> fmt::Debug for RetryOn<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryOn::All => write!(f, "RetryOn::All"),
            RetryOn::Failures => write!(f, "RetryOn::Failures"),
            RetryOn::Timeouts => write!(f, "RetryOn::Timeouts"),
            RetryOn::Failure(_) => write!(f, "RetryOn::Failure(<predicate>)"),
            RetryOn::Custom(_) => write!(f, "RetryOn::Custom(<predicate>)"),
        }
    }
}

/// Configuration for the retry controller.
///
/// `max_attempts` bounds the total number of executions per external call,
/// the first one included.
pub struct RetryPolicy<E> {
    max_attempts: u32,
    delay: Duration,
    retry_on: RetryOn<E>,
}

impl<E> RetryPolicy<E> {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::configuration(
                "retry max_attempts must be at least 1",
            ));
        }
        Ok(Self {
            max_attempts,
            delay,
            retry_on: RetryOn::All,
        })
    }

    pub fn from_settings(settings: &RetrySettings) -> Result<Self> {
        Self::new(settings.max_attempts, settings.delay())
    }

    /// Restrict which failures are retried
    #[must_use]
    pub fn retry_on(mut self, retry_on: RetryOn<E>) -> Self {
        self.retry_on = retry_on;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn should_retry(&self, error: &ExecError<E>) -> bool {
        self.retry_on.matches(error)
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            retry_on: RetryOn::All,
        }
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            delay: self.delay,
            retry_on: self.retry_on.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("retry_on", &self.retry_on)
            .finish()
    }
}

/// How a deadline is enforced for a given call kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Race a pool worker against the deadline; late work is abandoned, not killed
    ThreadRace,
    /// Drop the in-flight future at its next suspension point
    CooperativeCancel,
}

impl Enforcement {
    pub fn for_kind(kind: CallKind) -> Self {
        match kind {
            CallKind::Blocking => Enforcement::ThreadRace,
            CallKind::Suspending => Enforcement::CooperativeCancel,
        }
    }
}

/// Configuration for the timeout guard
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    deadline: Duration,
    pool: Option<Arc<WorkerPool>>,
}

impl TimeoutPolicy {
    pub fn new(deadline: Duration) -> Result<Self> {
        if deadline.is_zero() {
            return Err(Error::configuration(
                "timeout deadline must be greater than zero",
            ));
        }
        Ok(Self {
            deadline,
            pool: None,
        })
    }

    /// `None` when no deadline is configured
    pub fn from_settings(settings: &TimeoutSettings) -> Result<Option<Self>> {
        settings.deadline().map(Self::new).transpose()
    }

    /// Race blocking work on `pool` instead of the shared pool
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Pool used for thread-race enforcement
    pub fn pool(&self) -> Arc<WorkerPool> {
        self.pool.clone().unwrap_or_else(WorkerPool::global)
    }
}
