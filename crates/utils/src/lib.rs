//! Execution-control wrappers for runguard
//!
//! This crate holds everything that runs or waits on a unit of work: the
//! worker pool, executor offload, the retry controller and timeout guard,
//! and the smaller wrappers built on the same pattern. Every wrapper takes a
//! `UnitOfWork` and returns one of the same kind, except `run_on_executor`
//! which turns blocking work into suspending work.

pub mod async_runtime;
pub mod exclusive;
pub mod invoke;
pub mod jobs;
pub mod offload;
pub mod pool;
pub mod resilience;
pub mod timing;
pub mod tracing;

pub use async_runtime::{is_in_async_context, run_async, AsyncRuntime};
pub use exclusive::synchronized;
pub use invoke::Invoke;
pub use jobs::{run_jobs, run_jobs_default};
pub use offload::{
    offload_blocking, offload_suspending, run_on_executor, run_on_pool, spawn_background,
    BackgroundHandle, OffloadOptions, Offloaded,
};
pub use pool::{PoolStats, TaskHandle, WorkerPool};
pub use resilience::{Enforcement, RetryOn, RetryPolicy, TimeoutPolicy};
pub use timing::timed;
