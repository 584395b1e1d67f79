//! Stable error codes reported alongside control-layer failures

use std::fmt;

/// A stable `prefix-number` code with a short description.
///
/// Prefix `000` is the generic range, `500` the system range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: &'static str,
    pub message: &'static str,
}

impl ErrorCode {
    pub const OK: ErrorCode = ErrorCode::new("000-0000", "success");
    pub const FAILED: ErrorCode = ErrorCode::new("000-0001", "failed");
    pub const FUNC_TIMEOUT: ErrorCode =
        ErrorCode::new("000-0002", "function exceeded its deadline");
    pub const FUNC_RETRY: ErrorCode =
        ErrorCode::new("000-0003", "function exhausted its retry attempts");
    pub const SYSTEM: ErrorCode = ErrorCode::new("500-0500", "system error");

    const fn new(code: &'static str, message: &'static str) -> Self {
        Self { code, message }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
