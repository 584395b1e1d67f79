//! Call duration logging

use futures::FutureExt;
use runguard_core::UnitOfWork;
use std::sync::Arc;
use std::time::Instant;

/// Wrap `unit` so the wall-clock duration of every call is logged under `label`
pub fn timed<A, T, E>(label: impl Into<String>, unit: UnitOfWork<A, T, E>) -> UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let label: Arc<str> = Arc::from(label.into());
    match unit {
        UnitOfWork::Blocking(f) => UnitOfWork::from_blocking(move |args: A| {
            let started = Instant::now();
            let result = f(args);
            crate::tracing::call_completed(&label, started.elapsed(), result.is_ok());
            result
        }),
        UnitOfWork::Suspending(f) => UnitOfWork::from_suspending(move |args: A| {
            let label = Arc::clone(&label);
            let future = f(args);
            async move {
                let started = Instant::now();
                let result = future.await;
                crate::tracing::call_completed(&label, started.elapsed(), result.is_ok());
                result
            }
            .boxed()
        }),
    }
}
