//! Serialised calls to one wrapped unit

use futures::FutureExt;
use runguard_core::UnitOfWork;
use std::sync::Arc;

/// Wrap `unit` so at most one call runs at a time.
///
/// Blocking units take a thread lock, suspending units an async mutex, so a
/// waiting suspending caller yields instead of blocking its thread. The lock
/// belongs to this wrap; other wraps of the same function are independent.
pub fn synchronized<A, T, E>(unit: UnitOfWork<A, T, E>) -> UnitOfWork<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    match unit {
        UnitOfWork::Blocking(f) => {
            let lock = Arc::new(parking_lot::Mutex::new(()));
            UnitOfWork::from_blocking(move |args: A| {
                let _guard = lock.lock();
                f(args)
            })
        }
        UnitOfWork::Suspending(f) => {
            let lock = Arc::new(tokio::sync::Mutex::new(()));
            UnitOfWork::from_suspending(move |args: A| {
                let lock = Arc::clone(&lock);
                let f = Arc::clone(&f);
                async move {
                    let _guard = lock.lock().await;
                    f(args).await
                }
                .boxed()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::Invoke;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tracker() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn test_blocking_calls_never_overlap() {
        let (running, peak) = tracker();
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        let unit: UnitOfWork<(), (), String> = UnitOfWork::blocking(move |()| {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
        let wrapped = synchronized(unit);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let wrapped = wrapped.clone();
                std::thread::spawn(move || wrapped.call_blocking(()).unwrap())
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_suspending_calls_never_overlap() {
        let (running, peak) = tracker();
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        let unit: UnitOfWork<(), (), String> = UnitOfWork::suspending(move |()| {
            let (r, p) = (Arc::clone(&r), Arc::clone(&p));
            async move {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                r.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let wrapped = synchronized(unit);

        let calls: Vec<_> = (0..4).map(|_| tokio::spawn(wrapped.call(()))).collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
