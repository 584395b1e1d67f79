//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::CacheUnavailable {
                backend, message, ..
            } => {
                write!(f, "cache backend '{backend}' unavailable: {message}")
            }
            Error::CacheCorrupted { key, message } => {
                write!(f, "cached payload for '{key}' is malformed: {message}")
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::WorkerPool { message } => {
                write!(f, "worker pool error: {message}")
            }
            Error::TaskPanicked { task, message } => {
                write!(f, "task '{task}' panicked: {message}")
            }
            Error::TaskCancelled { task } => {
                write!(f, "task '{task}' was cancelled before completing")
            }
            Error::Runtime { message } => {
                write!(f, "runtime error: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::cache_corrupted("runguard:demo:f:abc", "expected value at line 1");
        let display = err.to_string();
        assert!(display.contains("runguard:demo:f:abc"));
        assert!(display.contains("malformed"));

        let err = Error::task_panicked("runguard-worker-0", "boom");
        assert_eq!(err.to_string(), "task 'runguard-worker-0' panicked: boom");
    }

    #[test]
    fn test_cache_unavailable_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::cache_unavailable_with_source("remote", io);

        assert!(err.is_cache_unavailable());
        assert!(err.to_string().contains("refused"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
