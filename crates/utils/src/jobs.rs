//! Bounded-concurrency job runner

use futures::future::join_all;
use runguard_core::{constants::DEFAULT_JOB_CONCURRENCY, Error, Result};
use std::future::Future;
use tokio::sync::Semaphore;

/// Run `jobs` with at most `workers` in flight, returning results in input order
pub async fn run_jobs<I, Fut>(jobs: I, workers: usize) -> Result<Vec<Fut::Output>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future,
{
    if workers == 0 {
        return Err(Error::configuration("run_jobs needs at least one worker"));
    }
    let semaphore = Semaphore::new(workers);

    let results = join_all(jobs.into_iter().map(|job| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| Error::runtime(format!("job semaphore closed: {e}")))?;
            Ok::<_, Error>(job.await)
        }
    }))
    .await;

    results.into_iter().collect()
}

/// [`run_jobs`] with the default concurrency
pub async fn run_jobs_default<I, Fut>(jobs: I) -> Result<Vec<Fut::Output>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future,
{
    run_jobs(jobs, DEFAULT_JOB_CONCURRENCY).await
}
