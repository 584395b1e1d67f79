//! Per-invocation error type returned by every wrapped unit of work

use super::codes::ErrorCode;
use super::types::Error;
use std::fmt;
use std::time::Duration;

/// Outcome of a failed invocation of a wrapped unit of work.
///
/// The variants let a caller tell a business failure apart from the control
/// layer giving up:
///
/// - [`ExecError::Failed`] carries the unit's own error, unmodified. This is
///   also how a non-retryable failure passes through a retry wrapper.
/// - [`ExecError::RetryExhausted`] means every allowed attempt failed with a
///   retryable failure.
/// - [`ExecError::TimeoutExceeded`] means the deadline elapsed first. For a
///   blocking unit the abandoned work may still be running on a worker pool.
/// - [`ExecError::Internal`] wraps an infrastructure [`Error`] such as a
///   corrupted cache payload or a panicked worker.
#[derive(Debug)]
pub enum ExecError<E> {
    /// The wrapped unit itself failed
    Failed(E),

    /// All attempts failed with a retryable failure
    RetryExhausted {
        /// Total executions, including the first
        attempts: u32,
        /// Failure observed on the final attempt
        last: Box<ExecError<E>>,
    },

    /// The deadline elapsed before a result was obtained
    TimeoutExceeded { deadline: Duration },

    /// Infrastructure failure inside the control layer
    Internal(Error),
}

impl<E> ExecError<E> {
    /// Create an exhausted error from the last failure
    pub fn exhausted(attempts: u32, last: ExecError<E>) -> Self {
        ExecError::RetryExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    /// Create a timeout error
    pub fn timeout(deadline: Duration) -> Self {
        ExecError::TimeoutExceeded { deadline }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecError::Failed(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ExecError::RetryExhausted { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::TimeoutExceeded { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ExecError::Internal(_))
    }

    /// Number of executions that led to this error
    pub fn attempts(&self) -> u32 {
        match self {
            ExecError::RetryExhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// The innermost business failure, looking through retry exhaustion
    pub fn failure(&self) -> Option<&E> {
        match self {
            ExecError::Failed(err) => Some(err),
            ExecError::RetryExhausted { last, .. } => last.failure(),
            _ => None,
        }
    }

    /// Consume this error, returning the innermost business failure
    pub fn into_failure(self) -> Option<E> {
        match self {
            ExecError::Failed(err) => Some(err),
            ExecError::RetryExhausted { last, .. } => last.into_failure(),
            _ => None,
        }
    }

    /// Stable code for reporting
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::Failed(_) => ErrorCode::FAILED,
            ExecError::RetryExhausted { .. } => ErrorCode::FUNC_RETRY,
            ExecError::TimeoutExceeded { .. } => ErrorCode::FUNC_TIMEOUT,
            ExecError::Internal(_) => ErrorCode::SYSTEM,
        }
    }

    /// Map the business failure type, keeping the control-layer structure
    pub fn map_failure<F, E2>(self, f: F) -> ExecError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            ExecError::Failed(err) => ExecError::Failed(f(err)),
            ExecError::RetryExhausted { attempts, last } => ExecError::RetryExhausted {
                attempts,
                last: Box::new(last.map_failure(f)),
            },
            ExecError::TimeoutExceeded { deadline } => ExecError::TimeoutExceeded { deadline },
            ExecError::Internal(err) => ExecError::Internal(err),
        }
    }
}

impl<E> From<Error> for ExecError<E> {
    fn from(error: Error) -> Self {
        ExecError::Internal(error)
    }
}

impl<E: fmt::Display> fmt::Display for ExecError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Failed(err) => write!(f, "{err}"),
            ExecError::RetryExhausted { attempts, last } => {
                write!(f, "retry exhausted after {attempts} attempts: {last}")
            }
            ExecError::TimeoutExceeded { deadline } => {
                write!(f, "function timed out after {deadline:?}")
            }
            ExecError::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl<E> std::error::Error for ExecError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Failed(err) => err.source(),
            ExecError::RetryExhausted { last, .. } => Some(last.as_ref()),
            ExecError::TimeoutExceeded { .. } => None,
            ExecError::Internal(err) => std::error::Error::source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exhausted_error() {
        let err: ExecError<io::Error> = ExecError::exhausted(
            3,
            ExecError::Failed(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
        );

        assert!(err.is_exhausted());
        assert!(!err.is_timeout());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.code(), ErrorCode::FUNC_RETRY);
        assert_eq!(err.failure().map(|e| e.kind()), Some(io::ErrorKind::TimedOut));
    }

    #[test]
    fn test_timeout_error() {
        let err: ExecError<io::Error> = ExecError::timeout(Duration::from_millis(50));

        assert!(err.is_timeout());
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.code().code, "000-0002");
        assert!(err.failure().is_none());
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn test_into_failure_looks_through_exhaustion() {
        let err: ExecError<String> =
            ExecError::exhausted(2, ExecError::Failed("original error".to_string()));

        assert_eq!(err.into_failure(), Some("original error".to_string()));
    }

    #[test]
    fn test_map_failure() {
        let err: ExecError<i32> = ExecError::exhausted(3, ExecError::Failed(42));

        let mapped = err.map_failure(|n| format!("error code: {n}"));
        assert!(matches!(
            mapped,
            ExecError::RetryExhausted { attempts: 3, ref last }
                if matches!(last.as_ref(), ExecError::Failed(s) if s == "error code: 42")
        ));
    }

    #[test]
    fn test_display() {
        let err: ExecError<io::Error> = ExecError::exhausted(
            3,
            ExecError::Failed(io::Error::new(io::ErrorKind::TimedOut, "connection timeout")),
        );

        let display = err.to_string();
        assert!(display.contains("retry exhausted"));
        assert!(display.contains("3 attempts"));
        assert!(display.contains("connection timeout"));
    }

    #[test]
    fn test_internal_from_error() {
        let err: ExecError<io::Error> = Error::worker_pool("pool is shut down").into();

        assert!(err.is_internal());
        assert_eq!(err.code(), ErrorCode::SYSTEM);
    }
}
