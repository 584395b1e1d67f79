//! Retry controller

use super::policy::RetryPolicy;
use futures::FutureExt;
use runguard_core::{ExecError, UnitOfWork};
use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    /// Failed with a failure the policy retries
    Retryable,
    /// Failed with a failure the policy passes through
    Fatal,
}

/// One execution try, kept only long enough to be logged
#[derive(Debug, Clone, Copy)]
pub struct Attempt {
    /// 1-based
    pub index: u32,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Decide what follows an attempt. `Continue` means sleep, then try again.
fn settle<T, E>(
    policy: &RetryPolicy<E>,
    index: u32,
    started: Instant,
    result: Result<T, ExecError<E>>,
) -> ControlFlow<Result<T, ExecError<E>>>
where
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let error = match result {
        Ok(value) => {
            let attempt = Attempt {
                index,
                outcome: AttemptOutcome::Succeeded,
                elapsed: started.elapsed(),
            };
            if index > 1 {
                tracing::info!(
                    attempt = attempt.index,
                    elapsed = ?attempt.elapsed,
                    "succeeded after retry"
                );
            }
            return ControlFlow::Break(Ok(value));
        }
        Err(error) => error,
    };

    if !policy.should_retry(&error) {
        let attempt = Attempt {
            index,
            outcome: AttemptOutcome::Fatal,
            elapsed: started.elapsed(),
        };
        tracing::debug!(attempt = attempt.index, error = %error, "failure is not retryable");
        return ControlFlow::Break(Err(error));
    }

    let attempt = Attempt {
        index,
        outcome: AttemptOutcome::Retryable,
        elapsed: started.elapsed(),
    };
    tracing::warn!(
        attempt = attempt.index,
        max_attempts,
        elapsed = ?attempt.elapsed,
        error = %error,
        "attempt failed"
    );

    if index >= max_attempts {
        tracing::error!(attempts = index, error = %error, "retry attempts exhausted");
        return ControlFlow::Break(Err(ExecError::exhausted(index, error)));
    }
    ControlFlow::Continue(())
}

/// Run `operation` until it succeeds, fails fatally, or runs out of attempts.
///
/// The delay is awaited between attempts, never after the last one.
pub async fn retry<F, Fut, T, E>(
    policy: &RetryPolicy<E>,
    mut operation: F,
) -> Result<T, ExecError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExecError<E>>>,
    E: fmt::Display,
{
    let mut index = 1;
    loop {
        let started = Instant::now();
        let result = operation().await;
        match settle(policy, index, started, result) {
            ControlFlow::Break(result) => return result,
            ControlFlow::Continue(()) => {
                if !policy.delay().is_zero() {
                    tokio::time::sleep(policy.delay()).await;
                }
                index += 1;
            }
        }
    }
}

/// Blocking counterpart of [`retry`]; the delay sleeps the calling thread.
pub fn retry_blocking<F, T, E>(
    policy: &RetryPolicy<E>,
    mut operation: F,
) -> Result<T, ExecError<E>>
where
    F: FnMut() -> Result<T, ExecError<E>>,
    E: fmt::Display,
{
    let mut index = 1;
    loop {
        let started = Instant::now();
        let result = operation();
        match settle(policy, index, started, result) {
            ControlFlow::Break(result) => return result,
            ControlFlow::Continue(()) => {
                if !policy.delay().is_zero() {
                    std::thread::sleep(policy.delay());
                }
                index += 1;
            }
        }
    }
}

/// Wrap `unit` so every call is retried under `policy`.
///
/// Arguments are cloned for each attempt.
pub fn wrap<A, T, E>(unit: UnitOfWork<A, T, E>, policy: RetryPolicy<E>) -> UnitOfWork<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let policy = Arc::new(policy);
    match unit {
        UnitOfWork::Blocking(f) => UnitOfWork::from_blocking(move |args: A| {
            retry_blocking(&policy, || f(args.clone()))
        }),
        UnitOfWork::Suspending(f) => UnitOfWork::from_suspending(move |args: A| {
            let f = Arc::clone(&f);
            let policy = Arc::clone(&policy);
            async move { retry(&policy, move || f(args.clone())).await }.boxed()
        }),
    }
}
