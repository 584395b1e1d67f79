//! Worker pool for blocking units of work
//!
//! Threads are spawned on demand up to `max_workers` and fed from one shared
//! queue. A process-wide pool is available through [`WorkerPool::global`];
//! wrappers accept an explicit pool to scope its lifetime instead.

mod handle;

pub use handle::TaskHandle;

use crossbeam::channel::{self, Receiver, Sender};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use runguard_config::OffloadSettings;
use runguard_core::{
    constants::{default_worker_count, WORKER_THREAD_PREFIX},
    Error, Result,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

static GLOBAL_POOL: Lazy<Arc<WorkerPool>> =
    Lazy::new(|| Arc::new(WorkerPool::build(WORKER_THREAD_PREFIX, default_worker_count())));

/// Worker accounting shared with the worker threads.
///
/// Every queued job is matched to a worker when it is submitted: an idle
/// worker is claimed, a new one is spawned, or the job joins the backlog
/// that finishing workers pick up before going idle again.
#[derive(Debug, Default)]
struct PoolState {
    live: usize,
    idle: usize,
    backlog: usize,
}

impl PoolState {
    fn job_finished(&mut self) {
        if self.backlog > 0 {
            self.backlog -= 1;
        } else {
            self.idle += 1;
        }
    }

    fn worker_exited(&mut self) {
        self.idle = self.idle.saturating_sub(1);
        self.live = self.live.saturating_sub(1);
    }
}

/// Snapshot of a pool's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub max_workers: usize,
    pub live_workers: usize,
    pub idle_workers: usize,
    pub queued_jobs: usize,
}

/// A bounded set of OS threads running blocking work.
pub struct WorkerPool {
    name: String,
    max_workers: usize,
    /// `None` once the pool is shut down
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    state: Arc<Mutex<PoolState>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    next_worker: AtomicUsize,
    next_task: AtomicU64,
}

impl WorkerPool {
    /// Create a pool running at most `max_workers` threads
    pub fn new(max_workers: usize) -> Result<Self> {
        Self::with_name(WORKER_THREAD_PREFIX, max_workers)
    }

    /// Create a pool whose threads are named `{name}-{n}`
    pub fn with_name(name: impl Into<String>, max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(Error::configuration(
                "worker pool needs at least one worker",
            ));
        }
        Ok(Self::build(name, max_workers))
    }

    /// Dedicated pool when `max_workers` is configured, the shared pool otherwise
    pub fn from_settings(settings: &OffloadSettings) -> Result<Arc<Self>> {
        match settings.max_workers {
            Some(max_workers) => Ok(Arc::new(Self::new(max_workers)?)),
            None => Ok(Self::global()),
        }
    }

    /// The lazily created process-wide pool
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_POOL)
    }

    fn build(name: impl Into<String>, max_workers: usize) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            name: name.into(),
            max_workers,
            sender: Mutex::new(Some(sender)),
            receiver,
            state: Arc::new(Mutex::new(PoolState::default())),
            threads: Mutex::new(Vec::new()),
            next_worker: AtomicUsize::new(0),
            next_task: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Queue `work` and return a handle to its result.
    ///
    /// Fails once the pool has been shut down.
    pub fn submit<F, T>(&self, work: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = self.next_task.fetch_add(1, Ordering::Relaxed);
        let (completer, handle) = handle::pair(format!("{}#{id}", self.name));

        let sender = self.sender.lock();
        let sender = sender
            .as_ref()
            .ok_or_else(|| Error::worker_pool(format!("pool '{}' is shut down", self.name)))?;

        // Held across the send so the claim and the queued job stay in step
        let mut state = self.state.lock();
        if state.idle > 0 {
            state.idle -= 1;
        } else if state.live < self.max_workers {
            self.spawn_worker(&mut state)?;
        } else {
            state.backlog += 1;
        }

        sender
            .send(Box::new(move || completer.run(work)))
            .map_err(|_| Error::worker_pool(format!("pool '{}' has no receiver", self.name)))?;
        Ok(handle)
    }

    /// Start a worker for a job about to be queued
    fn spawn_worker(&self, state: &mut PoolState) -> Result<()> {
        let index = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let receiver = self.receiver.clone();
        let shared = Arc::clone(&self.state);

        let spawned = thread::Builder::new()
            .name(format!("{}-{index}", self.name))
            .spawn(move || worker_loop(receiver, shared));

        match spawned {
            Ok(thread) => {
                tracing::trace!(pool = %self.name, worker = index, "spawned worker thread");
                state.live += 1;
                let mut threads = self.threads.lock();
                threads.retain(|t| !t.is_finished());
                threads.push(thread);
                Ok(())
            }
            Err(e) if state.live == 0 => Err(Error::worker_pool(format!(
                "failed to spawn worker for pool '{}': {e}",
                self.name
            ))),
            Err(e) => {
                tracing::warn!(pool = %self.name, error = %e, "failed to spawn extra worker");
                state.backlog += 1;
                Ok(())
            }
        }
    }

    /// Stop accepting work.
    ///
    /// Queued jobs still run. With `wait`, blocks until every worker exits.
    /// Calling this more than once is harmless.
    pub fn shutdown(&self, wait: bool) {
        if self.sender.lock().take().is_some() {
            tracing::debug!(pool = %self.name, "worker pool shutting down");
        }
        if !wait {
            return;
        }

        let threads: Vec<_> = self.threads.lock().drain(..).collect();
        let current = thread::current().id();
        for thread in threads {
            if thread.thread().id() == current {
                continue;
            }
            if thread.join().is_err() {
                tracing::warn!(pool = %self.name, "worker thread exited abnormally");
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            max_workers: self.max_workers,
            live_workers: state.live,
            idle_workers: state.idle,
            queued_jobs: self.receiver.len(),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

fn worker_loop(receiver: Receiver<Job>, state: Arc<Mutex<PoolState>>) {
    // Spawned for a job already claimed, so the first pass is not idle.
    // Ends once every sender is gone and the queue is drained.
    while let Ok(job) = receiver.recv() {
        job();
        state.lock().job_finished();
    }
    state.lock().worker_exited();
}
