//! The unit of work every wrapper consumes and produces

use super::kind::{classify, CallKind};
use crate::errors::ExecError;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A blocking function lifted into the control layer's error type
pub type BlockingFn<A, T, E> = Arc<dyn Fn(A) -> Result<T, ExecError<E>> + Send + Sync>;

/// A suspending function lifted into the control layer's error type
pub type SuspendingFn<A, T, E> =
    Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, ExecError<E>>> + Send + Sync>;

/// A callable taking `A` and producing `T`, failing with `E`.
///
/// The variant is the call-kind classification: it is chosen once, when the
/// unit is built, and every wrapper matches on it instead of re-detecting the
/// kind on each call. Wrappers return a unit of the same kind, so they stack.
pub enum UnitOfWork<A, T, E> {
    Blocking(BlockingFn<A, T, E>),
    Suspending(SuspendingFn<A, T, E>),
}

impl<A, T, E> UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wrap a function that runs to completion on the calling thread.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        UnitOfWork::Blocking(Arc::new(move |args| f(args).map_err(ExecError::Failed)))
    }

    /// Wrap a function whose result is produced by a future.
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        UnitOfWork::Suspending(Arc::new(move |args| {
            let fut = f(args);
            Box::pin(async move { fut.await.map_err(ExecError::Failed) })
        }))
    }

    /// Build a blocking unit from a function already speaking `ExecError`.
    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(A) -> Result<T, ExecError<E>> + Send + Sync + 'static,
    {
        UnitOfWork::Blocking(Arc::new(f))
    }

    /// Build a suspending unit from a function already speaking `ExecError`.
    pub fn from_suspending<F>(f: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<T, ExecError<E>>> + Send + Sync + 'static,
    {
        UnitOfWork::Suspending(Arc::new(f))
    }
}

impl<A, T, E> UnitOfWork<A, T, E> {
    pub fn kind(&self) -> CallKind {
        classify(self)
    }
}

impl<A, T, E> Clone for UnitOfWork<A, T, E> {
    fn clone(&self) -> Self {
        match self {
            UnitOfWork::Blocking(f) => UnitOfWork::Blocking(Arc::clone(f)),
            UnitOfWork::Suspending(f) => UnitOfWork::Suspending(Arc::clone(f)),
        }
    }
}

impl<A, T, E> fmt::Debug for UnitOfWork<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitOfWork::{}(<fn>)", self.kind())
    }
}
