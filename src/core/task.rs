//! Task packaging and the one-shot result handle.
//!
//! A submitted closure is wrapped into a [`Task`] that owns the producing half
//! of a single-slot channel. The worker that runs the task writes exactly one
//! outcome into it; the submitter holds the consuming half as a
//! [`ResultHandle`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use tracing::warn;

use super::error::TaskError;

/// Identifier assigned to every task accepted by a pool.
pub type TaskId = u64;

/// Outcome of a task as seen by the consumer of its handle.
pub type TaskResult<T> = Result<T, TaskError>;

/// How a task finished, reported back to the worker for accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskOutcome {
    /// The closure returned normally.
    Completed,
    /// The closure panicked.
    Panicked,
}

/// A unit of work waiting in a pool queue.
pub(crate) struct Task {
    id: TaskId,
    body: Box<dyn FnOnce() -> TaskOutcome + Send + 'static>,
}

impl Task {
    /// Package `f` together with the handle its result will be delivered to.
    pub(crate) fn with_handle<F, T>(id: TaskId, f: F) -> (Self, ResultHandle<T>)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = bounded::<TaskResult<T>>(1);

        let body = move || {
            let result = run_guarded(f);
            let outcome = if result.is_ok() {
                TaskOutcome::Completed
            } else {
                TaskOutcome::Panicked
            };
            // The submitter may have dropped its handle; the outcome still counts.
            let _ = tx.send(result);
            outcome
        };

        let task = Self {
            id,
            body: Box::new(body),
        };
        (task, ResultHandle { task_id: id, rx })
    }

    /// Package `f` with no handle. A panic is logged and otherwise discarded.
    pub(crate) fn detached<F>(id: TaskId, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let body = move || match run_guarded(f) {
            Ok(()) => TaskOutcome::Completed,
            Err(err) => {
                warn!(task_id = id, error = %err, "Detached task panicked");
                TaskOutcome::Panicked
            }
        };

        Self {
            id,
            body: Box::new(body),
        }
    }

    pub(crate) const fn id(&self) -> TaskId {
        self.id
    }

    /// Run the task on the current thread. Never unwinds.
    pub(crate) fn run(self) -> TaskOutcome {
        (self.body)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish_non_exhaustive()
    }
}

fn run_guarded<F, T>(f: F) -> TaskResult<T>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref())))
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// One-shot handle to the outcome of a submitted task.
///
/// The worker executing the task is the only producer and writes exactly once.
/// Reading consumes the handle, so a result can be observed at most once.
///
/// ```
/// use prometheus_task_engine::core::WorkerPool;
///
/// let pool = WorkerPool::with_capacity(2, 8).unwrap();
/// let handle = pool.submit(|| 6 * 7).unwrap();
/// assert_eq!(handle.get().unwrap(), 42);
/// pool.shutdown();
/// ```
pub struct ResultHandle<T> {
    task_id: TaskId,
    rx: Receiver<TaskResult<T>>,
}

impl<T> ResultHandle<T> {
    /// Identifier of the task this handle belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Whether the outcome has been written and a read would not block.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the task finishes and return its value.
    ///
    /// # Errors
    ///
    /// - `TaskError::Panicked` if the task panicked
    /// - `TaskError::Abandoned` if the task was dropped without running
    pub fn get(self) -> TaskResult<T> {
        self.rx.recv().unwrap_or(Err(TaskError::Abandoned))
    }

    /// Block for at most `timeout` waiting for the outcome.
    ///
    /// The handle is consumed on every outcome, including a timeout.
    ///
    /// # Errors
    ///
    /// - `TaskError::Timeout` if nothing arrived in time
    /// - `TaskError::Panicked` if the task panicked
    /// - `TaskError::Abandoned` if the task was dropped without running
    pub fn get_timeout(self, timeout: Duration) -> TaskResult<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(TaskError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(TaskError::Abandoned),
        }
    }

    /// Await the outcome from an async context.
    ///
    /// The blocking wait is moved onto tokio's blocking thread pool so the
    /// calling runtime stays responsive.
    ///
    /// # Errors
    ///
    /// Same as [`ResultHandle::get`].
    #[cfg(feature = "tokio-runtime")]
    pub async fn get_async(self) -> TaskResult<T>
    where
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(move || self.get())
            .await
            .unwrap_or(Err(TaskError::Abandoned))
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("task_id", &self.task_id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_receives_value() {
        let (task, handle) = Task::with_handle(7, || "done".to_string());
        assert_eq!(handle.task_id(), 7);
        assert!(!handle.is_ready());

        assert_eq!(task.run(), TaskOutcome::Completed);
        assert!(handle.is_ready());
        assert_eq!(handle.get().unwrap(), "done");
    }

    #[test]
    fn test_panic_is_captured() {
        let (task, handle) = Task::with_handle(1, || -> u32 { panic!("boom") });
        assert_eq!(task.run(), TaskOutcome::Panicked);
        assert_eq!(handle.get(), Err(TaskError::Panicked("boom".into())));
    }

    #[test]
    fn test_formatted_panic_message() {
        let (task, handle) = Task::with_handle(1, || -> u32 { panic!("bad index {}", 3) });
        task.run();
        assert_eq!(handle.get(), Err(TaskError::Panicked("bad index 3".into())));
    }

    #[test]
    fn test_dropped_task_abandons_handle() {
        let (task, handle) = Task::with_handle(2, || 1);
        drop(task);
        assert_eq!(handle.get(), Err(TaskError::Abandoned));
    }

    #[test]
    fn test_get_timeout_expires() {
        let (_task, handle) = Task::with_handle(3, || 1);
        let result = handle.get_timeout(Duration::from_millis(20));
        assert_eq!(result, Err(TaskError::Timeout));
    }

    #[test]
    fn test_run_survives_dropped_handle() {
        let (task, handle) = Task::with_handle(4, || 1);
        drop(handle);
        assert_eq!(task.run(), TaskOutcome::Completed);
    }

    #[test]
    fn test_detached_panic_is_reported() {
        let task = Task::detached(5, || panic!("detached"));
        assert_eq!(task.id(), 5);
        assert_eq!(task.run(), TaskOutcome::Panicked);
    }
}
