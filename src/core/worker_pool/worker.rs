//! Shared queue state and the per-worker loop.
//!
//! The queue is a monitor: one `parking_lot::Mutex` guarding the deque and
//! the shutdown flag, plus two condition variables. Submitters park on
//! `not_full`, idle workers park on `not_empty`.

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::PoolError;
use crate::core::task::{Task, TaskOutcome};

use super::PoolCounters;

/// State guarded by the pool lock.
#[derive(Debug, Default)]
pub(super) struct PoolState {
    queue: VecDeque<Task>,
    /// Workers currently parked waiting for work.
    idle_workers: usize,
    /// Tasks ever pushed, and tasks ever taken by a worker. A zero-capacity
    /// submitter waits until `handed_off` reaches its own push number.
    pushed: u64,
    handed_off: u64,
    shutdown: bool,
}

impl PoolState {
    /// Whether one more task may be admitted.
    ///
    /// With zero capacity a task is admitted only while a parked worker has
    /// not yet been handed one, so the queue never holds more tasks than
    /// there are workers waiting to take them.
    fn has_room(&self, capacity: usize) -> bool {
        if capacity == 0 {
            self.queue.len() < self.idle_workers
        } else {
            self.queue.len() < capacity
        }
    }
}

/// Queue, signalling, and counters shared between the pool and its workers.
#[derive(Debug)]
pub(super) struct PoolShared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    pub(super) counters: PoolCounters,
}

impl PoolShared {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            counters: PoolCounters::default(),
        }
    }

    /// Enqueue a task, blocking while the queue is at capacity.
    ///
    /// A submitter still waiting when shutdown begins is released with
    /// `PoolStopped` and its task is dropped unqueued.
    ///
    /// With zero capacity this is a rendezvous: the call returns only once a
    /// worker has taken the task, so the queue is empty whenever no submit is
    /// in progress.
    pub(super) fn push(&self, task: Task) -> Result<(), PoolError> {
        let capacity = self.capacity;
        let mut state = self.state.lock();
        self.not_full
            .wait_while(&mut state, |s| !s.shutdown && !s.has_room(capacity));

        if state.shutdown {
            return Err(PoolError::PoolStopped);
        }

        state.queue.push_back(task);
        state.pushed += 1;
        let ticket = state.pushed;
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        self.not_empty.notify_one();

        if capacity == 0 {
            // Workers drain the queue even after shutdown, so this always ends.
            self.not_full
                .wait_while(&mut state, |s| s.handed_off < ticket);
        }
        Ok(())
    }

    /// Take the next task, blocking while the queue is empty.
    ///
    /// Returns `None` once shutdown has begun and the queue is drained.
    fn pop(&self) -> Option<Task> {
        let mut state = self.state.lock();
        state.idle_workers += 1;
        if self.capacity == 0 {
            // A parked worker is room for one hand-off.
            self.not_full.notify_one();
        }

        self.not_empty
            .wait_while(&mut state, |s| s.queue.is_empty() && !s.shutdown);
        state.idle_workers -= 1;

        let task = state.queue.pop_front()?;
        state.handed_off += 1;
        drop(state);

        if self.capacity == 0 {
            // Wakes the submitter waiting on this hand-off as well as any
            // waiting for room.
            self.not_full.notify_all();
        } else {
            self.not_full.notify_one();
        }
        Some(task)
    }

    /// Flip the shutdown flag and wake every waiter.
    ///
    /// Returns `false` if shutdown had already begun.
    pub(super) fn begin_shutdown(&self) -> bool {
        let mut state = self.state.lock();
        if state.shutdown {
            return false;
        }
        state.shutdown = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    pub(super) fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    pub(super) fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub(super) const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Spawn a named worker thread running the worker loop.
pub(super) fn spawn_worker(
    worker_id: usize,
    shared: Arc<PoolShared>,
    config: &WorkerPoolConfig,
) -> Result<JoinHandle<()>, PoolError> {
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || run_worker(worker_id, &shared))
        .map_err(|e| PoolError::Spawn(e.to_string()))
}

fn run_worker(worker_id: usize, shared: &PoolShared) {
    debug!(worker_id = worker_id, "Worker thread started");

    while let Some(task) = shared.pop() {
        let task_id = task.id();
        shared.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(worker_id = worker_id, task_id = task_id, "Worker executing task");

        let outcome = task.run();

        shared.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
        match outcome {
            TaskOutcome::Completed => {
                shared.counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            TaskOutcome::Panicked => {
                shared.counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                warn!(worker_id = worker_id, task_id = task_id, "Task panicked");
            }
        }
    }

    debug!(worker_id = worker_id, "Worker thread exiting");
}
