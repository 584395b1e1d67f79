//! Wrapper behaviour through the facade

use runguard::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

#[tokio::test]
async fn test_retry_exhausts_after_max_attempts() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let unit: UnitOfWork<(), (), String> = UnitOfWork::blocking(move |()| {
        seen.fetch_add(1, Ordering::SeqCst);
        Err("invalid value".to_string())
    });

    let wrapped = Control::new(unit)
        .retry(RetryPolicy::new(3, Duration::ZERO).unwrap())
        .build();
    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.failure().map(String::as_str), Some("invalid value"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_returns_first_success() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let unit: UnitOfWork<(), Value, String> = UnitOfWork::suspending(move |()| {
        let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n <= 2 {
                Err(format!("attempt {n}"))
            } else {
                Ok(json!({ "ok": true }))
            }
        }
    });

    let wrapped = Control::new(unit)
        .retry(RetryPolicy::new(5, Duration::ZERO).unwrap())
        .build();

    assert_eq!(wrapped.call(()).await.unwrap(), json!({ "ok": true }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_timeout_returns_result_before_deadline() {
    let unit: UnitOfWork<(), &'static str, String> = UnitOfWork::blocking(|()| {
        std::thread::sleep(Duration::from_millis(50));
        Ok("done")
    });

    let wrapped = Control::new(unit)
        .timeout(TimeoutPolicy::new(Duration::from_millis(200)).unwrap())
        .build();

    assert_eq!(wrapped.call_blocking(()).unwrap(), "done");
}

#[test]
fn test_timeout_expires_within_bounded_overhead() {
    let unit: UnitOfWork<(), &'static str, String> = UnitOfWork::blocking(|()| {
        std::thread::sleep(Duration::from_millis(200));
        Ok("done")
    });
    let wrapped = Control::new(unit)
        .timeout(TimeoutPolicy::new(Duration::from_millis(50)).unwrap())
        .build();

    let started = Instant::now();
    let err = wrapped.call_blocking(()).unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_millis(180));
}

#[test]
fn test_memoize_within_and_after_ttl() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let unit: UnitOfWork<CallArgs, Value, String> = UnitOfWork::blocking(move |args: CallArgs| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "name": args.get("name"), "age": args.get("age") }))
    });
    let wrapped = Control::new(unit)
        .memoize(
            call_identity!("profile"),
            CacheBackend::blocking(MemoryCache::new(8).unwrap()),
            MemoizeOptions::new().ttl(Duration::from_secs(1)),
        )
        .unwrap()
        .build();
    let args = || CallArgs::new().kwarg("name", "a").kwarg("age", 1);

    let first = wrapped.call_blocking(args()).unwrap();
    let second = wrapped.call_blocking(args()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);

    std::thread::sleep(Duration::from_millis(1500));
    wrapped.call_blocking(args()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_deadline_per_attempt_inside_retry() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let unit: UnitOfWork<(), &'static str, String> = UnitOfWork::suspending(move |()| {
        let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let pause = if n == 1 { 200 } else { 5 };
            tokio::time::sleep(Duration::from_millis(pause)).await;
            Ok("settled")
        }
    });

    let wrapped = Control::new(unit)
        .timeout(TimeoutPolicy::new(Duration::from_millis(50)).unwrap())
        .retry(RetryPolicy::new(3, Duration::ZERO).unwrap())
        .build();

    assert_eq!(wrapped.call(()).await.unwrap(), "settled");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_deadline_around_retry_bounds_whole_loop() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let unit: UnitOfWork<(), (), String> = UnitOfWork::suspending(move |()| {
        seen.fetch_add(1, Ordering::SeqCst);
        async { Err("still failing".to_string()) }
    });

    let wrapped = Control::new(unit)
        .retry(RetryPolicy::new(50, Duration::from_millis(20)).unwrap())
        .timeout(TimeoutPolicy::new(Duration::from_millis(100)).unwrap())
        .build();

    assert!(wrapped.call(()).await.unwrap_err().is_timeout());
    assert!(calls.load(Ordering::SeqCst) < 50);
}

#[tokio::test]
async fn test_cooperative_cancel_stops_suspending_work() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let unit: UnitOfWork<(), (), String> = UnitOfWork::suspending(move |()| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    });
    let wrapped = Control::new(unit)
        .timeout(TimeoutPolicy::new(Duration::from_millis(30)).unwrap())
        .build();

    assert!(wrapped.call(()).await.unwrap_err().is_timeout());
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(!finished.load(Ordering::SeqCst));
}

#[test]
fn test_thread_race_abandons_but_does_not_stop_blocking_work() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let unit: UnitOfWork<(), (), String> = UnitOfWork::blocking(move |()| {
        std::thread::sleep(Duration::from_millis(150));
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    let pool = Arc::new(WorkerPool::with_name("abandon", 1).unwrap());
    let wrapped = Control::new(unit)
        .timeout(TimeoutPolicy::new(Duration::from_millis(30)).unwrap().with_pool(pool.clone()))
        .build();

    assert!(wrapped.call_blocking(()).unwrap_err().is_timeout());
    std::thread::sleep(Duration::from_millis(300));

    assert!(finished.load(Ordering::SeqCst));
    pool.shutdown(true);
}

#[tokio::test]
async fn test_on_executor_runs_blocking_work_off_the_runtime() {
    let pool = Arc::new(WorkerPool::with_name("facade-exec", 2).unwrap());
    let unit: UnitOfWork<(), String, String> = UnitOfWork::blocking(|()| {
        Ok(std::thread::current().name().unwrap_or_default().to_string())
    });

    let wrapped = Control::new(unit).on_executor(Some(pool.clone())).build();

    assert_eq!(wrapped.kind(), CallKind::Suspending);
    assert!(wrapped.call(()).await.unwrap().starts_with("facade-exec"));
    pool.shutdown(true);
}
