//! Constants used throughout the runguard workspace
use std::time::Duration;

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(DEFAULT_RETRY_DELAY_MS);

// Memoization defaults
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_KEY_PREFIX: &str = "runguard";
pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 256;

// Worker pool sizing, mirrors the usual `min(32, cpus + 4)` thread pool default
pub const MAX_DEFAULT_WORKERS: usize = 32;
pub const EXTRA_DEFAULT_WORKERS: usize = 4;
pub const WORKER_THREAD_PREFIX: &str = "runguard-worker";

// Bounded job runner
pub const DEFAULT_JOB_CONCURRENCY: usize = 5;

// Environment variable names
pub const RUNGUARD_CONFIG_VAR: &str = "RUNGUARD_CONFIG";
pub const RUNGUARD_LOG_VAR: &str = "RUNGUARD_LOG";
pub const RUNGUARD_RETRY_MAX_ATTEMPTS_VAR: &str = "RUNGUARD_RETRY_MAX_ATTEMPTS";
pub const RUNGUARD_RETRY_DELAY_MS_VAR: &str = "RUNGUARD_RETRY_DELAY_MS";
pub const RUNGUARD_TIMEOUT_MS_VAR: &str = "RUNGUARD_TIMEOUT_MS";
pub const RUNGUARD_MAX_WORKERS_VAR: &str = "RUNGUARD_MAX_WORKERS";
pub const RUNGUARD_CACHE_PREFIX_VAR: &str = "RUNGUARD_CACHE_PREFIX";
pub const RUNGUARD_CACHE_TTL_SECS_VAR: &str = "RUNGUARD_CACHE_TTL_SECS";
pub const RUNGUARD_CACHE_CAPACITY_VAR: &str = "RUNGUARD_CACHE_CAPACITY";

/// Default worker count for a pool built without an explicit size.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + EXTRA_DEFAULT_WORKERS).min(MAX_DEFAULT_WORKERS)
}
