//! Core domain types, errors, and constants for `runguard`.
//!
//! This crate establishes the foundational data structures and error handling
//! shared by every execution-control wrapper in the workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: The infrastructure `Error` enum with its `Result` alias, and
//!   the per-invocation `ExecError<E>` that separates business failures from
//!   control-layer outcomes (retry exhaustion, deadline expiry).
//! - **`types`**: The `UnitOfWork` tagged type, its `CallKind` classification,
//!   and the `CallArgs` / `CallIdentity` pair used for memoization keys.
//! - **`constants`**: Defaults for every wrapper option and the environment
//!   variable names recognised by the configuration layer.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, ErrorCode, ExecError, Result},
    types::*,
};
