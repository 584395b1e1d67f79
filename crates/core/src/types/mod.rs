//! Core domain types for the execution-control layer.
//!
//! ## Organization
//!
//! - **`kind`**: The `CallKind` classification and its detector
//! - **`unit`**: The `UnitOfWork` tagged type every wrapper consumes and returns
//! - **`args`**: Positional and keyword call arguments
//! - **`identity`**: Module-qualified identity of a wrapped function

pub mod args;
pub mod identity;
pub mod kind;
pub mod unit;

pub use args::CallArgs;
pub use identity::CallIdentity;
pub use kind::{classify, CallKind};
pub use unit::{BlockingFn, SuspendingFn, UnitOfWork};
