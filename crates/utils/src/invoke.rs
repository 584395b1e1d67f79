//! Calling a unit of work from either kind of caller

use crate::async_runtime::run_async;
use crate::offload::run_on_pool;
use crate::pool::WorkerPool;
use futures::future::BoxFuture;
use futures::FutureExt;
use runguard_core::{ExecError, UnitOfWork};

/// Uniform entry points for invoking a [`UnitOfWork`].
pub trait Invoke<A, T, E> {
    /// Call from blocking code.
    ///
    /// Suspending units are driven on a private current-thread runtime, which
    /// is refused when the caller is already inside a runtime.
    fn call_blocking(&self, args: A) -> Result<T, ExecError<E>>;

    /// Call from suspending code. Blocking units run on the shared pool.
    fn call(&self, args: A) -> BoxFuture<'static, Result<T, ExecError<E>>>;
}

impl<A, T, E> Invoke<A, T, E> for UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn call_blocking(&self, args: A) -> Result<T, ExecError<E>> {
        match self {
            UnitOfWork::Blocking(f) => f(args),
            UnitOfWork::Suspending(f) => run_async(f(args))?,
        }
    }

    fn call(&self, args: A) -> BoxFuture<'static, Result<T, ExecError<E>>> {
        match self {
            UnitOfWork::Blocking(f) => run_on_pool(WorkerPool::global(), f.clone(), args).boxed(),
            UnitOfWork::Suspending(f) => f(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_blocking_on_both_kinds() {
        let blocking: UnitOfWork<u8, u8, String> = UnitOfWork::blocking(|n| Ok(n + 1));
        let suspending: UnitOfWork<u8, u8, String> =
            UnitOfWork::suspending(|n| async move { Ok(n + 2) });

        assert_eq!(blocking.call_blocking(1).unwrap(), 2);
        assert_eq!(suspending.call_blocking(1).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_call_on_both_kinds() {
        let blocking: UnitOfWork<u8, u8, String> = UnitOfWork::blocking(|n| Ok(n * 2));
        let suspending: UnitOfWork<u8, u8, String> =
            UnitOfWork::suspending(|n| async move { Err(format!("rejected {n}")) });

        assert_eq!(blocking.call(4).await.unwrap(), 8);
        assert!(matches!(
            suspending.call(4).await,
            Err(ExecError::Failed(ref m)) if m == "rejected 4"
        ));
    }

    #[tokio::test]
    async fn test_call_blocking_inside_runtime_is_refused() {
        let suspending: UnitOfWork<(), (), String> = UnitOfWork::suspending(|()| async { Ok(()) });

        let err = suspending.call_blocking(()).unwrap_err();

        assert!(err.is_internal());
    }
}
