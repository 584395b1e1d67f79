//! Executor offload
//!
//! Moves blocking work onto a [`WorkerPool`] so a suspending caller is not
//! blocked, and schedules work as background tasks whose completion nobody is
//! required to await.

use crate::pool::{TaskHandle, WorkerPool};
use futures::FutureExt;
use runguard_config::OffloadSettings;
use runguard_core::{BlockingFn, Error, ExecError, Result, SuspendingFn, UnitOfWork};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Where and how offloaded work runs
#[derive(Debug, Clone, Default)]
pub struct OffloadOptions {
    /// Pool for blocking work; the shared pool when `None`
    pub pool: Option<Arc<WorkerPool>>,
    /// Return a handle instead of waiting for the result
    pub background: bool,
}

impl OffloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn from_settings(settings: &OffloadSettings) -> Result<Self> {
        Ok(Self {
            pool: settings
                .max_workers
                .is_some()
                .then(|| WorkerPool::from_settings(settings))
                .transpose()?,
            background: settings.background,
        })
    }

    /// The pool blocking work is submitted to
    pub fn pool(&self) -> Arc<WorkerPool> {
        self.pool.clone().unwrap_or_else(WorkerPool::global)
    }
}

/// Result of an offload call
#[derive(Debug)]
pub enum Offloaded<T, E> {
    /// The caller waited and got the result
    Completed(T),
    /// The work is still running in the background
    Background(BackgroundHandle<T, E>),
}

impl<T, E> Offloaded<T, E> {
    pub fn is_background(&self) -> bool {
        matches!(self, Offloaded::Background(_))
    }

    /// Value of a completed call, waiting on the handle when it went to the background
    pub async fn resolve(self) -> std::result::Result<T, ExecError<E>> {
        match self {
            Offloaded::Completed(value) => Ok(value),
            Offloaded::Background(handle) => handle.join().await,
        }
    }
}

enum Inner<T, E> {
    Pool(TaskHandle<std::result::Result<T, ExecError<E>>>),
    Task(JoinHandle<std::result::Result<T, ExecError<E>>>),
}

/// Handle to background work.
///
/// Awaiting it is optional; dropping it detaches the work.
pub struct BackgroundHandle<T, E> {
    inner: Inner<T, E>,
}

impl<T, E> BackgroundHandle<T, E> {
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Pool(handle) => handle.is_finished(),
            Inner::Task(handle) => handle.is_finished(),
        }
    }

    /// Wait for the background work and return its result
    pub async fn join(self) -> std::result::Result<T, ExecError<E>> {
        match self.inner {
            Inner::Pool(handle) => handle.await?,
            Inner::Task(handle) => match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    Err(Error::task_panicked("background task", e.to_string()).into())
                }
                Err(_) => Err(Error::task_cancelled("background task").into()),
            },
        }
    }
}

impl<T, E> fmt::Debug for BackgroundHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            Inner::Pool(_) => "pool",
            Inner::Task(_) => "task",
        };
        f.debug_struct("BackgroundHandle")
            .field("kind", &kind)
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn log_background_failure<T, E: fmt::Display>(result: &std::result::Result<T, ExecError<E>>) {
    if let Err(error) = result {
        tracing::warn!(error = %error, code = %error.code(), "background task failed");
    }
}

/// Submit a blocking function to `pool` and await its result
pub async fn run_on_pool<A, T, E>(
    pool: Arc<WorkerPool>,
    f: BlockingFn<A, T, E>,
    args: A,
) -> std::result::Result<T, ExecError<E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = pool.submit(move || f(args))?;
    handle.await?
}

/// Run a blocking function on the options' pool.
///
/// Without `background` the caller suspends until the pool finishes the work.
/// With it a handle is returned immediately and failures are only logged.
pub async fn offload_blocking<A, T, E>(
    f: BlockingFn<A, T, E>,
    args: A,
    options: &OffloadOptions,
) -> std::result::Result<Offloaded<T, E>, ExecError<E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    if options.background {
        let handle = submit_background(&options.pool(), f, args)?;
        return Ok(Offloaded::Background(handle));
    }
    run_on_pool(options.pool(), f, args)
        .await
        .map(Offloaded::Completed)
}

/// Await a suspending function, or spawn it on the current runtime with `background`
pub async fn offload_suspending<A, T, E>(
    f: SuspendingFn<A, T, E>,
    args: A,
    options: &OffloadOptions,
) -> std::result::Result<Offloaded<T, E>, ExecError<E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    if options.background {
        let handle = spawn_task(f, args)?;
        return Ok(Offloaded::Background(handle));
    }
    f(args).await.map(Offloaded::Completed)
}

/// Start `unit` without waiting for it, whatever its kind
pub fn spawn_background<A, T, E>(
    unit: &UnitOfWork<A, T, E>,
    args: A,
    options: &OffloadOptions,
) -> Result<BackgroundHandle<T, E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    match unit {
        UnitOfWork::Blocking(f) => submit_background(&options.pool(), Arc::clone(f), args),
        UnitOfWork::Suspending(f) => spawn_task(Arc::clone(f), args),
    }
}

fn submit_background<A, T, E>(
    pool: &WorkerPool,
    f: BlockingFn<A, T, E>,
    args: A,
) -> Result<BackgroundHandle<T, E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let handle = pool.submit(move || {
        let result = f(args);
        log_background_failure(&result);
        result
    })?;
    Ok(BackgroundHandle {
        inner: Inner::Pool(handle),
    })
}

fn spawn_task<A, T, E>(f: SuspendingFn<A, T, E>, args: A) -> Result<BackgroundHandle<T, E>>
where
    A: Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let runtime = Handle::try_current()
        .map_err(|e| Error::runtime(format!("background task needs a tokio runtime: {e}")))?;
    let future = f(args);
    let handle = runtime.spawn(async move {
        let result = future.await;
        log_background_failure(&result);
        result
    });
    Ok(BackgroundHandle {
        inner: Inner::Task(handle),
    })
}

/// Turn a blocking unit into a suspending one that runs on `pool`.
///
/// Suspending units are returned unchanged.
pub fn run_on_executor<A, T, E>(
    unit: UnitOfWork<A, T, E>,
    pool: Option<Arc<WorkerPool>>,
) -> UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    match unit {
        UnitOfWork::Blocking(f) => {
            let pool = pool.unwrap_or_else(WorkerPool::global);
            UnitOfWork::from_suspending(move |args: A| {
                run_on_pool(Arc::clone(&pool), Arc::clone(&f), args).boxed()
            })
        }
        suspending @ UnitOfWork::Suspending(_) => suspending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runguard_core::CallKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn dedicated_pool() -> Arc<WorkerPool> {
        Arc::new(WorkerPool::with_name("offload-test", 2).unwrap())
    }

    fn blocking_fn(delay: Duration, ran: Arc<AtomicBool>) -> BlockingFn<u32, u32, String> {
        Arc::new(move |n: u32| -> std::result::Result<u32, ExecError<String>> {
            std::thread::sleep(delay);
            ran.store(true, Ordering::SeqCst);
            if n == 0 {
                Err(ExecError::Failed("zero".to_string()))
            } else {
                Ok(n * 10)
            }
        })
    }

    #[tokio::test]
    async fn test_offload_blocking_waits_for_result() {
        let pool = dedicated_pool();
        let options = OffloadOptions::new().with_pool(Arc::clone(&pool));
        let ran = Arc::new(AtomicBool::new(false));

        let outcome = offload_blocking(blocking_fn(Duration::ZERO, Arc::clone(&ran)), 4, &options)
            .await
            .unwrap();

        assert!(matches!(outcome, Offloaded::Completed(40)));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_offload_blocking_background_returns_immediately() {
        let options = OffloadOptions::new()
            .with_pool(dedicated_pool())
            .background(true);
        let ran = Arc::new(AtomicBool::new(false));

        let outcome = offload_blocking(
            blocking_fn(Duration::from_millis(100), Arc::clone(&ran)),
            2,
            &options,
        )
        .await
        .unwrap();

        assert!(outcome.is_background());
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(outcome.resolve().await.unwrap(), 20);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_background_failure_surfaces_only_when_joined() {
        let options = OffloadOptions::new()
            .with_pool(dedicated_pool())
            .background(true);

        let outcome = offload_blocking(
            blocking_fn(Duration::ZERO, Arc::new(AtomicBool::new(false))),
            0,
            &options,
        )
        .await
        .unwrap();

        let Offloaded::Background(handle) = outcome else {
            panic!("expected a background handle");
        };
        assert!(matches!(
            handle.join().await,
            Err(ExecError::Failed(ref msg)) if msg == "zero"
        ));
    }

    #[tokio::test]
    async fn test_offload_suspending() {
        let unit: UnitOfWork<u32, u32, String> =
            UnitOfWork::suspending(|n| async move { Ok(n + 1) });
        let UnitOfWork::Suspending(f) = unit else {
            panic!("expected a suspending unit");
        };

        let direct = offload_suspending(Arc::clone(&f), 1, &OffloadOptions::new())
            .await
            .unwrap();
        let background = offload_suspending(f, 2, &OffloadOptions::new().background(true))
            .await
            .unwrap();

        assert!(matches!(direct, Offloaded::Completed(2)));
        assert!(background.is_background());
        assert_eq!(background.resolve().await.unwrap(), 3);
    }

    #[test]
    fn test_spawn_background_without_runtime() {
        let unit: UnitOfWork<(), (), String> = UnitOfWork::suspending(|()| async { Ok(()) });

        let err = spawn_background(&unit, (), &OffloadOptions::new()).unwrap_err();

        assert!(matches!(err, Error::Runtime { .. }));
    }

    #[test]
    fn test_spawn_background_blocking_unit() {
        let unit: UnitOfWork<u32, u32, String> = UnitOfWork::blocking(|n| Ok(n + 1));
        let options = OffloadOptions::new().with_pool(dedicated_pool());

        let handle = spawn_background(&unit, 41, &options).unwrap();
        let result = crate::async_runtime::run_async(handle.join()).unwrap();

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_run_on_executor_changes_kind() {
        let unit: UnitOfWork<u32, String, String> = UnitOfWork::blocking(|n| {
            Ok(format!(
                "{n} on {}",
                std::thread::current().name().unwrap_or_default()
            ))
        });

        let offloaded = run_on_executor(unit, Some(dedicated_pool()));
        assert_eq!(offloaded.kind(), CallKind::Suspending);

        let UnitOfWork::Suspending(f) = offloaded else {
            panic!("expected a suspending unit");
        };
        assert_eq!(f(7).await.unwrap(), "7 on offload-test-0");
    }

    #[test]
    fn test_options_from_settings() {
        let shared = OffloadOptions::from_settings(&OffloadSettings::default()).unwrap();
        assert!(shared.pool.is_none());
        assert!(Arc::ptr_eq(&shared.pool(), &WorkerPool::global()));

        let dedicated = OffloadOptions::from_settings(&OffloadSettings {
            max_workers: Some(3),
            background: true,
        })
        .unwrap();
        assert!(dedicated.background);
        assert_eq!(dedicated.pool().max_workers(), 3);
    }
}
