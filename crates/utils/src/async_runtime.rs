//! Bridge for driving suspending work from a blocking caller

use runguard_core::{Error, Result};
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

/// Lazily built current-thread runtime for blocking callers
pub struct AsyncRuntime {
    runtime: Option<Runtime>,
}

impl AsyncRuntime {
    /// Create a new async runtime manager
    #[must_use]
    pub fn new() -> Self {
        Self { runtime: None }
    }

    /// Get or create a runtime
    fn get_or_create_runtime(&mut self) -> Result<&Runtime> {
        if self.runtime.is_none() {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| Error::runtime(format!("failed to create tokio runtime: {e}")))?;
            self.runtime = Some(runtime);
        }

        self.runtime
            .as_ref()
            .ok_or_else(|| Error::runtime("runtime unexpectedly missing after initialization"))
    }

    /// Drive `future` to completion on this manager's runtime
    pub fn block_on<F>(&mut self, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        if Self::is_in_async_context() {
            return Err(Error::runtime(
                "cannot use block_on from within an async runtime",
            ));
        }
        let runtime = self.get_or_create_runtime()?;
        Ok(runtime.block_on(future))
    }

    /// Check if we're already in an async context
    #[must_use]
    pub fn is_in_async_context() -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }
}

impl Default for AsyncRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a future to completion from blocking code.
///
/// Refuses to run inside a runtime, where blocking the thread would stall
/// the scheduler.
pub fn run_async<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    let mut runtime = AsyncRuntime::new();
    runtime.block_on(future)
}

/// Whether the calling thread is inside a tokio runtime
pub fn is_in_async_context() -> bool {
    AsyncRuntime::is_in_async_context()
}
