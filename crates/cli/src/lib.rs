//! Execution control for blocking and suspending functions
//!
//! `runguard` wraps a [`UnitOfWork`](model::UnitOfWork) with retries, deadlines, executor
//! offload and memoization. Each wrapper returns a unit of the same kind, so
//! they stack in any order; [`Control`] is a builder over that stacking.
//!
//! ```no_run
//! use runguard::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> runguard::model::Result<()> {
//! let fetch: UnitOfWork<u32, String, String> =
//!     UnitOfWork::blocking(|id| Ok(format!("order {id}")));
//!
//! let guarded = Control::new(fetch)
//!     .timeout(TimeoutPolicy::new(Duration::from_millis(200))?)
//!     .retry(RetryPolicy::new(3, Duration::from_millis(50))?)
//!     .build();
//!
//! assert_eq!(guarded.call_blocking(7).unwrap(), "order 7");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod control;
mod execute;

pub use control::Control;
pub use runguard_cache as cache;
pub use runguard_config as config;
pub use runguard_core as model;
pub use runguard_utils as utils;

/// Everything needed to wrap and call a unit of work
pub mod prelude {
    pub use crate::control::Control;
    pub use runguard_cache::{
        memoize, AsyncRemoteCache, CacheBackend, MemoizeOptions, MemoryCache, RemoteCache,
    };
    pub use runguard_config::ControlConfig;
    pub use runguard_core::{
        call_identity, CallArgs, CallIdentity, CallKind, ExecError, UnitOfWork,
    };
    pub use runguard_utils::{
        offload_blocking, offload_suspending, run_on_executor, spawn_background, Invoke,
        OffloadOptions, Offloaded, RetryOn, RetryPolicy, TimeoutPolicy, WorkerPool,
    };
}
