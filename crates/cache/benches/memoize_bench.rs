//! Benchmarks for key derivation and memoized lookups

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use runguard_cache::{derive_key, memoize, CacheBackend, MemoizeOptions, MemoryCache};
use runguard_core::{CallArgs, CallIdentity, UnitOfWork};
use tokio::runtime::Runtime;

fn setup_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_key_derivation(c: &mut Criterion) {
    let identity = CallIdentity::new("bench", "derive");
    let mut group = c.benchmark_group("key_derivation");

    for keywords in [0usize, 4, 16] {
        let args = (0..keywords).fold(CallArgs::new().arg("positional"), |args, i| {
            args.kwarg(format!("field{i}"), i)
        });
        group.bench_with_input(BenchmarkId::from_parameter(keywords), &args, |b, args| {
            b.iter(|| derive_key("bench", black_box(&identity), black_box(args)))
        });
    }

    group.finish();
}

fn bench_memoized_hit(c: &mut Criterion) {
    let unit: UnitOfWork<CallArgs, u64, String> =
        UnitOfWork::blocking(|args: CallArgs| Ok(args.positional().len() as u64));
    let wrapped = memoize(
        unit,
        CallIdentity::new("bench", "hit"),
        CacheBackend::blocking(MemoryCache::new(1024).unwrap()),
        MemoizeOptions::new(),
    )
    .unwrap();
    let UnitOfWork::Blocking(f) = wrapped else {
        panic!("expected a blocking unit");
    };
    let args = CallArgs::new().arg(1).kwarg("mode", "fast");
    f(args.clone()).unwrap();

    c.bench_function("memoized_hit_blocking", |b| {
        b.iter(|| f(black_box(args.clone())).unwrap())
    });
}

fn bench_memoized_hit_async(c: &mut Criterion) {
    let rt = setup_runtime();
    let unit: UnitOfWork<CallArgs, u64, String> =
        UnitOfWork::suspending(|args: CallArgs| async move { Ok(args.positional().len() as u64) });
    let wrapped = memoize(
        unit,
        CallIdentity::new("bench", "hit_async"),
        CacheBackend::blocking(MemoryCache::new(1024).unwrap()),
        MemoizeOptions::new(),
    )
    .unwrap();
    let UnitOfWork::Suspending(f) = wrapped else {
        panic!("expected a suspending unit");
    };
    let args = CallArgs::new().arg(2);
    rt.block_on(f(args.clone())).unwrap();

    c.bench_function("memoized_hit_suspending", |b| {
        b.to_async(&rt).iter(|| {
            let fut = f(args.clone());
            async move { fut.await.unwrap() }
        })
    });
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_memoized_hit,
    bench_memoized_hit_async
);
criterion_main!(benches);
