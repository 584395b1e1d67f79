//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for runguard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure and configuration errors raised by the execution-control layer
/// itself, as opposed to failures of the wrapped unit of work.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid wrapper or pool configuration, rejected at wrap time
    Configuration { message: String },

    /// Cache backend could not be reached; callers treat this as a miss
    CacheUnavailable {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cached payload exists but cannot be decoded
    CacheCorrupted { key: String, message: String },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool refused or lost a submission
    WorkerPool { message: String },

    /// Offloaded work panicked
    TaskPanicked { task: String, message: String },

    /// Offloaded work was dropped or aborted before producing a result
    TaskCancelled { task: String },

    /// No suitable scheduler for the requested operation
    Runtime { message: String },
}
