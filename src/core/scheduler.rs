//! Time-ordered scheduler feeding a [`WorkerPool`].
//!
//! One dispatch thread owns the pending-item heap. It sleeps until either the
//! earliest item comes due or a new item is posted, then hands due callables
//! to the pool. Periodic items come due again `interval` after each
//! submission, so a slow firing shifts every later one rather than bunching
//! them up.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_task_engine::core::{Scheduler, WorkerPool};
//!
//! let pool = Arc::new(WorkerPool::with_capacity(2, 16).unwrap());
//! let scheduler = Scheduler::new(Arc::clone(&pool)).unwrap();
//!
//! scheduler.post(|| println!("now")).unwrap();
//! scheduler.post_after(Duration::from_millis(10), || println!("later")).unwrap();
//! scheduler.post_every(Duration::from_millis(50), || println!("tick")).unwrap();
//!
//! scheduler.shutdown();
//! pool.shutdown();
//! ```

mod item;

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::core::error::SchedulerError;
use crate::core::worker_pool::WorkerPool;

use item::{ItemKind, OnceFn, RepeatFn, ScheduleItem};

/// State guarded by the scheduler lock.
#[derive(Debug, Default)]
struct SchedulerState {
    items: BinaryHeap<ScheduleItem>,
    next_seq: u64,
    shutdown: bool,
}

impl SchedulerState {
    fn insert(&mut self, due: Instant, kind: ItemKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.push(ScheduleItem { due, seq, kind });
        seq
    }
}

struct SchedulerShared {
    state: Mutex<SchedulerState>,
    wakeup: Condvar,
    pool: Arc<WorkerPool>,
}

/// Scheduler for immediate, delayed, and periodic work.
///
/// Dropping the scheduler shuts it down. Shutting down the scheduler does
/// not shut down the pool it feeds.
pub struct Scheduler {
    shared: Arc<SchedulerShared>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Bind to `pool` and start the dispatch thread.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Spawn` if the dispatch thread could not be started.
    pub fn new(pool: Arc<WorkerPool>) -> Result<Self, SchedulerError> {
        Self::with_config(pool, SchedulerConfig::default())
    }

    /// Bind to `pool` using explicit configuration.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if the configuration is invalid
    /// - `SchedulerError::Spawn` if the dispatch thread could not be started
    pub fn with_config(
        pool: Arc<WorkerPool>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidArgument)?;

        let shared = Arc::new(SchedulerShared {
            state: Mutex::new(SchedulerState::default()),
            wakeup: Condvar::new(),
            pool,
        });

        let dispatcher = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run_dispatch(&shared))
                .map_err(|e| SchedulerError::Spawn(e.to_string()))?
        };

        info!(thread_name = %config.thread_name, "Scheduler started");

        Ok(Self {
            shared,
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    /// Run `f` as soon as the dispatch thread next wakes.
    ///
    /// # Errors
    ///
    /// `SchedulerError::PoolStopped` if the scheduler or its pool is shut down.
    pub fn post<F>(&self, f: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Instant::now(), ItemKind::Once(Box::new(f) as OnceFn))
    }

    /// Run `f` once, no earlier than `delay` from now.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if `delay` overflows the clock
    /// - `SchedulerError::PoolStopped` if the scheduler or its pool is shut down
    pub fn post_after<F>(&self, delay: Duration, f: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let due = due_after(delay)?;
        self.schedule(due, ItemKind::Once(Box::new(f) as OnceFn))
    }

    /// Run `f` every `interval`, first firing one `interval` from now.
    ///
    /// Each firing comes due `interval` after the previous one was handed to
    /// the pool. A firing that panics does not stop later ones.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if `interval` is zero or overflows
    ///   the clock
    /// - `SchedulerError::PoolStopped` if the scheduler or its pool is shut down
    pub fn post_every<F>(&self, interval: Duration, f: F) -> Result<(), SchedulerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidArgument(
                "post_every interval must be greater than zero".into(),
            ));
        }
        let due = due_after(interval)?;
        let f: RepeatFn = Arc::new(f);
        self.schedule(due, ItemKind::Every { interval, f })
    }

    fn schedule(&self, due: Instant, kind: ItemKind) -> Result<(), SchedulerError> {
        if self.shared.pool.is_shutdown() {
            return Err(SchedulerError::PoolStopped);
        }

        let mut state = self.shared.state.lock();
        if state.shutdown {
            return Err(SchedulerError::PoolStopped);
        }
        let seq = state.insert(due, kind);
        drop(state);

        self.shared.wakeup.notify_one();
        debug!(seq = seq, "Item scheduled");
        Ok(())
    }

    /// Number of items waiting to come due.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    /// The pool this scheduler submits to.
    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.shared.pool
    }

    /// Stop the dispatch thread and discard every pending item.
    ///
    /// Work already handed to the pool is unaffected. Calling it again
    /// returns immediately.
    pub fn shutdown(&self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            let discarded = state.items.len();
            state.items.clear();
            discarded
        };
        self.shared.wakeup.notify_all();

        info!(discarded = discarded, "Shutting down scheduler");

        if let Some(handle) = self.dispatcher.lock().take() {
            if handle.join().is_err() {
                warn!("Dispatch thread panicked");
            }
        }

        info!("Scheduler shut down complete");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("shutdown", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

fn due_after(delay: Duration) -> Result<Instant, SchedulerError> {
    Instant::now()
        .checked_add(delay)
        .ok_or_else(|| SchedulerError::InvalidArgument(format!("{delay:?} overflows the clock")))
}

fn run_dispatch(shared: &SchedulerShared) {
    debug!("Dispatch thread started");

    let mut state = shared.state.lock();
    while !state.shutdown {
        let Some(due) = state.items.peek().map(ScheduleItem::due) else {
            shared.wakeup.wait(&mut state);
            continue;
        };

        if due > Instant::now() {
            // Woken early by a new item or shutdown; either way re-examine the head.
            shared.wakeup.wait_until(&mut state, due);
            continue;
        }

        let Some(item) = state.items.pop() else {
            continue;
        };

        let repeat = MutexGuard::unlocked(&mut state, || dispatch(&shared.pool, item));

        if let Some((interval, f)) = repeat {
            if state.shutdown {
                continue;
            }
            match Instant::now().checked_add(interval) {
                Some(next) => {
                    state.insert(next, ItemKind::Every { interval, f });
                }
                None => warn!(?interval, "Periodic item dropped: next due time overflows"),
            }
        }
    }

    debug!("Dispatch thread exiting");
}

/// Hand a due item to the pool.
///
/// Returns the callable and interval of a periodic item that should be
/// rescheduled.
fn dispatch(pool: &WorkerPool, item: ScheduleItem) -> Option<(Duration, RepeatFn)> {
    let seq = item.seq;
    let (submitted, repeat) = match item.kind {
        ItemKind::Once(f) => (pool.execute(f), None),
        ItemKind::Every { interval, f } => {
            let job = Arc::clone(&f);
            (pool.execute(move || job()), Some((interval, f)))
        }
    };

    match submitted {
        Ok(()) => {
            debug!(seq = seq, "Scheduled item dispatched");
            repeat
        }
        Err(err) => {
            warn!(seq = seq, error = %err, "Pool rejected scheduled item; dropping it");
            None
        }
    }
}
