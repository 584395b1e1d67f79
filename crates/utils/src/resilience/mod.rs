//! Retry and deadline enforcement for units of work.
//!
//! Both wrappers read the unit's call kind once, when wrapping, and build the
//! matching blocking or suspending code path.
//!
//! ## Key Components
//!
//! - **`policy`**: `RetryPolicy`, `RetryOn`, `TimeoutPolicy` and the
//!   `Enforcement` mode derived from the call kind
//! - **`retry`**: the retry controller loop for both call kinds
//! - **`timeout`**: thread-race and cooperative-cancel deadline guards
//!
//! ## Examples
//!
//! ```rust,no_run
//! use runguard_core::UnitOfWork;
//! use runguard_utils::resilience::{retry, timeout, RetryPolicy, TimeoutPolicy};
//! use std::time::Duration;
//!
//! # fn example() -> runguard_core::Result<()> {
//! let fetch: UnitOfWork<u32, String, String> =
//!     UnitOfWork::blocking(|id| Ok(format!("record {id}")));
//!
//! let guarded = timeout::wrap(fetch, TimeoutPolicy::new(Duration::from_millis(200))?);
//! let resilient = retry::wrap(guarded, RetryPolicy::new(3, Duration::from_millis(50))?);
//! # let _ = resilient;
//! # Ok(())
//! # }
//! ```

pub mod policy;
pub mod retry;
pub mod timeout;

pub use policy::{Enforcement, RetryOn, RetryPolicy, TimeoutPolicy};
pub use retry::{retry, retry_blocking, Attempt, AttemptOutcome};
pub use timeout::{with_deadline, with_deadline_blocking};
