//! Built-in scenarios exercising each wrapper

use super::Scenario;
use crate::control::Control;
use runguard_cache::{CacheBackend, MemoizeOptions, MemoryCache};
use runguard_config::ControlConfig;
use runguard_core::{call_identity, CallArgs, ExecError, UnitOfWork};
use runguard_utils::{
    offload_blocking, spawn_background, Invoke, OffloadOptions, RetryOn, RetryPolicy,
    TimeoutPolicy,
};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub async fn execute(config: &ControlConfig, scenario: Scenario) -> eyre::Result<()> {
    match scenario {
        Scenario::Retry => retry().await.map(|_| ()),
        Scenario::Timeout => timeout().await.map(|_| ()),
        Scenario::Memoize => memoize(config).await.map(|_| ()),
        Scenario::Offload => offload(config).await.map(|_| ()),
        Scenario::All => {
            retry().await?;
            timeout().await?;
            memoize(config).await?;
            offload(config).await?;
            Ok(())
        }
    }
}

fn report<T: fmt::Debug, E: fmt::Display>(
    group: &str,
    name: &str,
    outcome: &Result<T, ExecError<E>>,
    detail: impl fmt::Display,
) {
    match outcome {
        Ok(value) => println!("[{group}] {name}: ok {value:?} ({detail})"),
        Err(err) => println!("[{group}] {name}: {} {err} ({detail})", err.code()),
    }
}

fn counted<T, F>(calls: &Arc<AtomicU32>, f: F) -> UnitOfWork<(), T, String>
where
    T: Send + 'static,
    F: Fn(u32) -> Result<T, String> + Send + Sync + 'static,
{
    let calls = Arc::clone(calls);
    UnitOfWork::blocking(move |()| f(calls.fetch_add(1, Ordering::SeqCst) + 1))
}

fn calls_made(calls: &AtomicU32) -> String {
    format!("{} calls", calls.load(Ordering::SeqCst))
}

/// Calls made by each retry case
async fn retry() -> eyre::Result<[u32; 3]> {
    let first = Arc::new(AtomicU32::new(0));
    let always_failing = counted(&first, |n| Err::<(), _>(format!("invalid value on call {n}")));
    let unit = Control::new(always_failing)
        .retry(RetryPolicy::new(3, Duration::ZERO)?)
        .build();
    let outcome = unit.call(()).await;
    report("retry", "always failing, 3 attempts", &outcome, calls_made(&first));

    let second = Arc::new(AtomicU32::new(0));
    let recovering = counted(&second, |n| {
        if n <= 2 {
            Err(format!("transient failure on call {n}"))
        } else {
            Ok(json!({ "ok": true }))
        }
    });
    let unit = Control::new(recovering)
        .retry(RetryPolicy::new(5, Duration::ZERO)?)
        .build();
    let outcome = unit.call(()).await;
    report("retry", "fails twice then succeeds", &outcome, calls_made(&second));

    let third = Arc::new(AtomicU32::new(0));
    let rejected = counted(&third, |_| Err::<(), _>("permission denied".to_string()));
    let policy = RetryPolicy::new(5, Duration::ZERO)?
        .retry_on(RetryOn::failure(|e: &String| e.contains("transient")));
    let unit = Control::new(rejected).retry(policy).build();
    let outcome = unit.call(()).await;
    report("retry", "non-retryable failure", &outcome, calls_made(&third));

    Ok([&first, &second, &third].map(|calls| calls.load(Ordering::SeqCst)))
}

fn sleeper(duration: Duration) -> UnitOfWork<(), &'static str, String> {
    UnitOfWork::blocking(move |()| {
        std::thread::sleep(duration);
        Ok("done")
    })
}

fn async_sleeper(duration: Duration) -> UnitOfWork<(), &'static str, String> {
    UnitOfWork::suspending(move |()| async move {
        tokio::time::sleep(duration).await;
        Ok("done")
    })
}

/// Whether each timeout case hit its deadline
async fn timeout() -> eyre::Result<Vec<bool>> {
    let cases = [
        ("blocking 50ms within 200ms", sleeper(Duration::from_millis(50)), 200),
        ("blocking 200ms within 50ms", sleeper(Duration::from_millis(200)), 50),
        ("suspending 50ms within 200ms", async_sleeper(Duration::from_millis(50)), 200),
        ("suspending 200ms within 50ms", async_sleeper(Duration::from_millis(200)), 50),
    ];

    let mut timed_out = Vec::with_capacity(cases.len());
    for (name, unit, deadline_ms) in cases {
        let unit = Control::new(unit)
            .timeout(TimeoutPolicy::new(Duration::from_millis(deadline_ms))?)
            .build();
        let started = Instant::now();
        let outcome = unit.call(()).await;
        report("timeout", name, &outcome, format!("{:?}", started.elapsed()));
        timed_out.push(outcome.as_ref().is_err_and(ExecError::is_timeout));
    }

    Ok(timed_out)
}

/// Computations made so far after each memoized call
async fn memoize(config: &ControlConfig) -> eyre::Result<[u32; 3]> {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&calls);
    let profile: UnitOfWork<CallArgs, Value, String> =
        UnitOfWork::blocking(move |args: CallArgs| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "name": args.get("name").cloned().unwrap_or(Value::Null),
                "age": args.get("age").cloned().unwrap_or(Value::Null),
            }))
        });
    let unit = Control::new(profile)
        .memoize(
            call_identity!("profile"),
            CacheBackend::blocking(MemoryCache::from_settings(&config.cache)?),
            MemoizeOptions::from_settings(&config.cache).ttl(Duration::from_secs(1)),
        )?
        .build();
    let args = || CallArgs::new().kwarg("name", "a").kwarg("age", 1);

    let mut counts = [0; 3];

    let first = unit.call(args()).await;
    counts[0] = calls.load(Ordering::SeqCst);
    report("memoize", "first call", &first, calls_made(&calls));

    let second = unit.call(args()).await;
    counts[1] = calls.load(Ordering::SeqCst);
    report("memoize", "repeat within ttl", &second, calls_made(&calls));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let third = unit.call(args()).await;
    counts[2] = calls.load(Ordering::SeqCst);
    report("memoize", "repeat after ttl", &third, calls_made(&calls));

    Ok(counts)
}

/// Whether each offload case produced a value
async fn offload(config: &ControlConfig) -> eyre::Result<[bool; 3]> {
    let options = OffloadOptions::from_settings(&config.offload)?;
    let checksum: UnitOfWork<u64, u64, String> = UnitOfWork::blocking(|n| Ok((1..=n).sum()));
    let UnitOfWork::Blocking(f) = checksum.clone() else {
        eyre::bail!("checksum unit is not blocking");
    };

    let awaited = offload_blocking(Arc::clone(&f), 1_000, &options)
        .await
        .map(|done| done.is_background());
    report("offload", "awaited on pool", &awaited, "background = false");

    let handle = offload_blocking(f, 10_000, &options.clone().background(true)).await;
    let joined = match handle {
        Ok(offloaded) => offloaded.resolve().await,
        Err(err) => Err(err),
    };
    report("offload", "background on pool, joined later", &joined, "background = true");

    let ticker: UnitOfWork<(), &'static str, String> = UnitOfWork::suspending(|()| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok("tick")
    });
    let handle = spawn_background(&ticker, (), &options)?;
    let started = handle.is_finished();
    let ticked = handle.join().await;
    let detail = format!("finished at spawn = {started}");
    report("offload", "background task", &ticked, detail);

    let stats = options.pool().stats();
    println!(
        "[offload] pool: {} live of {} max, {} idle",
        stats.live_workers, stats.max_workers, stats.idle_workers
    );

    Ok([
        matches!(awaited, Ok(false)),
        matches!(joined, Ok(50_005_000)),
        matches!(ticked, Ok("tick")),
    ])
}
