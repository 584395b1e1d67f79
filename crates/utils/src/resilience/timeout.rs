//! Timeout guard
//!
//! Blocking units race a pool worker against the deadline. When the deadline
//! wins the worker is abandoned, not interrupted: it runs to completion and
//! its result is dropped. Suspending units are cancelled cooperatively by
//! dropping their future, which takes effect at the next suspension point.

use super::policy::{Enforcement, TimeoutPolicy};
use crate::pool::WorkerPool;
use futures::FutureExt;
use runguard_core::{ExecError, UnitOfWork};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run `work` on `pool`, waiting at most `deadline` for its result
pub fn with_deadline_blocking<F, T, E>(
    deadline: Duration,
    pool: &WorkerPool,
    work: F,
) -> Result<T, ExecError<E>>
where
    F: FnOnce() -> Result<T, ExecError<E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let started = Instant::now();
    let handle = pool.submit(work)?;

    match handle.wait_timeout(deadline) {
        Some(result) => {
            let result = result?;
            if started.elapsed() >= deadline {
                tracing::warn!(?deadline, "result arrived after the deadline, discarding it");
                return Err(ExecError::timeout(deadline));
            }
            result
        }
        None => {
            tracing::warn!(
                ?deadline,
                task = handle.task(),
                "deadline elapsed, abandoning blocking work that keeps running on the pool"
            );
            Err(ExecError::timeout(deadline))
        }
    }
}

/// Await `future` for at most `deadline`, dropping it when the deadline wins
pub async fn with_deadline<F, T, E>(deadline: Duration, future: F) -> Result<T, ExecError<E>>
where
    F: Future<Output = Result<T, ExecError<E>>>,
{
    let started = tokio::time::Instant::now();
    match tokio::time::timeout(deadline, future).await {
        Ok(_) if started.elapsed() >= deadline => {
            tracing::warn!(?deadline, "result arrived after the deadline, discarding it");
            Err(ExecError::timeout(deadline))
        }
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?deadline, "deadline elapsed, cancelled suspending work");
            Err(ExecError::timeout(deadline))
        }
    }
}

/// Wrap `unit` so every call is bounded by the policy's deadline
pub fn wrap<A, T, E>(unit: UnitOfWork<A, T, E>, policy: TimeoutPolicy) -> UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let deadline = policy.deadline();
    let enforcement = Enforcement::for_kind(unit.kind());
    tracing::debug!(?deadline, ?enforcement, "wrapping unit with timeout guard");

    match unit {
        UnitOfWork::Blocking(f) => {
            let pool = policy.pool();
            UnitOfWork::from_blocking(move |args: A| {
                let f = Arc::clone(&f);
                with_deadline_blocking(deadline, &pool, move || f(args))
            })
        }
        UnitOfWork::Suspending(f) => {
            UnitOfWork::from_suspending(move |args: A| with_deadline(deadline, f(args)).boxed())
        }
    }
}
