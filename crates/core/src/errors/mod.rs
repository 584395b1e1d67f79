//! Error types for runguard operations

mod builders;
mod codes;
mod conversions;
mod display;
mod exec;
mod types;

pub use codes::ErrorCode;
pub use exec::ExecError;
pub use types::{Error, Result};
