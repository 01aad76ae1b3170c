//! Bounded worker pool running closures on dedicated OS threads.
//!
//! # Key Features
//!
//! - **Backpressure**: `submit` blocks while the queue is at capacity
//! - **Strict FIFO**: tasks are dequeued in the order they were accepted
//! - **Panic isolation**: a panicking task never takes its worker down
//! - **Draining shutdown**: queued tasks finish before workers exit
//!
//! # Example
//!
//! ```
//! use prometheus_task_engine::config::WorkerPoolConfig;
//! use prometheus_task_engine::core::WorkerPool;
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new()
//!         .with_worker_count(4)
//!         .with_max_queue_size(16),
//! ).unwrap();
//!
//! let handle = pool.submit(|| (1..=10).sum::<u32>()).unwrap();
//! assert_eq!(handle.get().unwrap(), 55);
//!
//! pool.shutdown();
//! ```

mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::PoolError;
use crate::core::task::{ResultHandle, Task, TaskId};

use worker::{spawn_worker, PoolShared};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Queue capacity.
    pub capacity: usize,

    /// Tasks waiting in the queue.
    pub queued_tasks: usize,

    /// Currently executing tasks.
    pub active_tasks: u64,

    /// Total tasks accepted into the queue.
    pub submitted_tasks: u64,

    /// Total tasks that returned normally.
    pub completed_tasks: u64,

    /// Total tasks that panicked.
    pub failed_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, capacity: usize, queued_tasks: usize) -> PoolStats {
        PoolStats {
            worker_count,
            capacity,
            queued_tasks,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Worker pool with a fixed set of OS threads and a bounded FIFO queue.
///
/// The pool is shut down when dropped. A task that never returns keeps its
/// worker busy forever and will hang [`WorkerPool::shutdown`]; keeping tasks
/// finite is the caller's responsibility.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Queue and signalling shared with the workers.
    shared: Arc<PoolShared>,

    /// Worker thread handles, taken on shutdown.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Task ID counter.
    task_id_counter: AtomicU64,
}

impl WorkerPool {
    /// Create a new worker pool and start its workers.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Spawn` if a worker thread could not be started; workers
    ///   already running are shut down first
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let shared = Arc::new(PoolShared::new(config.max_queue_size));
        let mut workers = Vec::with_capacity(config.worker_count);

        for worker_id in 0..config.worker_count {
            match spawn_worker(worker_id, Arc::clone(&shared), &config) {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    error!(worker_id = worker_id, error = %err, "Failed to start worker");
                    shared.begin_shutdown();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(err);
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            max_queue_size = config.max_queue_size,
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            shared,
            workers: Mutex::new(workers),
            task_id_counter: AtomicU64::new(0),
        })
    }

    /// Create a pool with `worker_count` workers and a queue of `max_queue_size`,
    /// other settings at their defaults.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerPool::new`].
    pub fn with_capacity(worker_count: usize, max_queue_size: usize) -> Result<Self, PoolError> {
        Self::new(
            WorkerPoolConfig::new()
                .with_worker_count(worker_count)
                .with_max_queue_size(max_queue_size),
        )
    }

    /// Submit a closure and get a handle to its result.
    ///
    /// Blocks while the queue is full.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolStopped` if shutdown has begun, including while this
    /// call was waiting for space.
    pub fn submit<F, T>(&self, f: F) -> Result<ResultHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = Task::with_handle(self.next_task_id(), f);
        self.enqueue(task)?;
        Ok(handle)
    }

    /// Submit a closure whose result is not needed.
    ///
    /// Same blocking behavior as [`WorkerPool::submit`]. A panic in `f` is
    /// logged and counted in [`PoolStats::failed_tasks`].
    ///
    /// # Errors
    ///
    /// `PoolError::PoolStopped` if shutdown has begun.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Task::detached(self.next_task_id(), f))
    }

    fn enqueue(&self, task: Task) -> Result<(), PoolError> {
        let task_id = task.id();
        match self.shared.push(task) {
            Ok(()) => {
                debug!(task_id = task_id, "Task submitted to worker pool");
                Ok(())
            }
            Err(err) => {
                debug!(task_id = task_id, "Task rejected, pool stopped");
                Err(err)
            }
        }
    }

    fn next_task_id(&self) -> TaskId {
        self.task_id_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot(
            self.config.worker_count,
            self.shared.capacity(),
            self.shared.queued(),
        )
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Queue capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.config.max_queue_size
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Shut down the pool.
    ///
    /// Rejects new submissions, releases blocked submitters with
    /// `PoolStopped`, lets workers finish every task already queued, then
    /// joins them. Calling it again returns immediately. When called from one
    /// of the pool's own workers, that worker is left to exit on its own.
    pub fn shutdown(&self) {
        if !self.shared.begin_shutdown() {
            return;
        }

        info!(queued_tasks = self.shared.queued(), "Shutting down worker pool");

        let workers = std::mem::take(&mut *self.workers.lock());
        let worker_count = workers.len();
        let current = thread::current().id();

        for (worker_id, worker) in workers.into_iter().enumerate() {
            if worker.thread().id() == current {
                warn!(worker_id = worker_id, "Shutdown called from a worker; not joining it");
                continue;
            }
            match worker.join() {
                Ok(()) => debug!(worker_id = worker_id, "Worker joined successfully"),
                Err(_) => warn!(worker_id = worker_id, "Worker panicked"),
            }
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
