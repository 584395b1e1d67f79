//! Completion slot shared between a worker and whoever waits for its result

use futures::task::AtomicWaker;
use parking_lot::{Condvar, Mutex};
use runguard_core::{Error, Result};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

enum State<T> {
    Pending,
    Ready(Result<T>),
    Taken,
}

struct Slot<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
    waker: AtomicWaker,
}

impl<T> Slot<T> {
    fn fill(&self, result: Result<T>) {
        {
            let mut state = self.state.lock();
            if matches!(*state, State::Pending) {
                *state = State::Ready(result);
            }
        }
        self.ready.notify_all();
        self.waker.wake();
    }
}

fn take<T>(state: &mut State<T>) -> Result<T> {
    match std::mem::replace(state, State::Taken) {
        State::Ready(result) => result,
        State::Pending => {
            *state = State::Pending;
            Err(Error::worker_pool("task result is not ready"))
        }
        State::Taken => Err(Error::worker_pool("task result was already taken")),
    }
}

/// Handle to work submitted to a [`WorkerPool`](super::WorkerPool).
///
/// Dropping the handle abandons the result; the work itself keeps running.
pub struct TaskHandle<T> {
    slot: Arc<Slot<T>>,
    task: String,
}

/// Worker side of a [`TaskHandle`]. Reports cancellation if dropped unrun.
pub(crate) struct Completer<T> {
    slot: Option<Arc<Slot<T>>>,
    task: String,
}

pub(crate) fn pair<T>(task: String) -> (Completer<T>, TaskHandle<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(State::Pending),
        ready: Condvar::new(),
        waker: AtomicWaker::new(),
    });
    (
        Completer {
            slot: Some(Arc::clone(&slot)),
            task: task.clone(),
        },
        TaskHandle { slot, task },
    )
}

impl<T> Completer<T> {
    /// Run `work`, turning a panic into [`Error::TaskPanicked`]
    pub(crate) fn run<F>(mut self, work: F)
    where
        F: FnOnce() -> T,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(work))
            .map_err(|payload| Error::task_panicked(self.task.clone(), panic_message(&*payload)));
        if let Some(slot) = self.slot.take() {
            slot.fill(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fill(Err(Error::task_cancelled(self.task.clone())));
        }
    }
}

impl<T> TaskHandle<T> {
    /// Name of the submitted task
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn is_finished(&self) -> bool {
        !matches!(*self.slot.state.lock(), State::Pending)
    }

    /// Block the calling thread until the work finishes
    pub fn wait(self) -> Result<T> {
        let mut state = self.slot.state.lock();
        while matches!(*state, State::Pending) {
            self.slot.ready.wait(&mut state);
        }
        take(&mut state)
    }

    /// Block for at most `timeout`.
    ///
    /// Returns `None` when the work has not finished in time. The handle stays
    /// usable, so the caller may wait again or drop it.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        while matches!(*state, State::Pending) {
            if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        match *state {
            State::Pending => None,
            _ => Some(take(&mut state)),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.slot.waker.register(cx.waker());
        let mut state = self.slot.state.lock();
        match *state {
            State::Pending => Poll::Pending,
            _ => Poll::Ready(take(&mut state)),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task", &self.task)
            .field("finished", &self.is_finished())
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completer_fills_handle() {
        let (completer, handle) = pair::<u32>("add".to_string());
        assert!(!handle.is_finished());

        completer.run(|| 40 + 2);

        assert!(handle.is_finished());
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn test_panic_becomes_error() {
        let (completer, handle) = pair::<u32>("boom".to_string());

        completer.run(|| panic!("worker exploded"));

        let err = handle.wait().unwrap_err();
        assert!(matches!(err, Error::TaskPanicked { ref task, ref message }
            if task == "boom" && message == "worker exploded"));
    }

    #[test]
    fn test_dropped_completer_cancels() {
        let (completer, handle) = pair::<u32>("never".to_string());
        drop(completer);

        assert!(matches!(handle.wait(), Err(Error::TaskCancelled { .. })));
    }

    #[test]
    fn test_wait_timeout_then_result() {
        let (completer, handle) = pair::<&'static str>("slow".to_string());

        assert!(handle.wait_timeout(Duration::from_millis(10)).is_none());

        let worker = std::thread::spawn(move || completer.run(|| "done"));
        let result = handle.wait_timeout(Duration::from_secs(5));
        worker.join().unwrap();

        assert_eq!(result.unwrap().unwrap(), "done");
        assert!(handle.wait_timeout(Duration::ZERO).unwrap().is_err());
    }

    #[tokio::test]
    async fn test_handle_is_awaitable() {
        let (completer, handle) = pair::<String>("async".to_string());

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            completer.run(|| "from thread".to_string());
        });

        assert_eq!(handle.await.unwrap(), "from thread");
    }
}
