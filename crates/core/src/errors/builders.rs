//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a cache connectivity error
    #[must_use]
    pub fn cache_unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CacheUnavailable {
            backend: backend.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a cache connectivity error with the client's error as source
    #[must_use]
    pub fn cache_unavailable_with_source(
        backend: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let source = source.into();
        Error::CacheUnavailable {
            backend: backend.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a corrupted payload error
    #[must_use]
    pub fn cache_corrupted(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CacheCorrupted {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a JSON error with a custom message
    #[must_use]
    pub fn json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Json {
            message: message.into(),
            source,
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a worker pool error
    #[must_use]
    pub fn worker_pool(message: impl Into<String>) -> Self {
        Error::WorkerPool {
            message: message.into(),
        }
    }

    /// Create a panicked task error
    #[must_use]
    pub fn task_panicked(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TaskPanicked {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled task error
    #[must_use]
    pub fn task_cancelled(task: impl Into<String>) -> Self {
        Error::TaskCancelled { task: task.into() }
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime {
            message: message.into(),
        }
    }

    /// Whether this error means the cache could not be reached, as opposed to
    /// returning something unusable.
    #[must_use]
    pub fn is_cache_unavailable(&self) -> bool {
        matches!(self, Error::CacheUnavailable { .. })
    }

    /// Whether this error is a wrap-time configuration rejection
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}
