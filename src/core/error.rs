//! Error types for pool, scheduler, and task operations.

use thiserror::Error;

/// Errors produced by [`WorkerPool`](crate::core::WorkerPool) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Shutdown has begun; the submission was not queued.
    #[error("worker pool stopped")]
    PoolStopped,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Errors produced by [`Scheduler`](crate::core::Scheduler) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The scheduler or its pool is no longer accepting work.
    #[error("scheduler stopped")]
    PoolStopped,
    /// An argument was rejected at call time.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The pool could not be constructed.
    #[error("pool error: {0}")]
    Pool(PoolError),
    /// The dispatch thread could not be started.
    #[error("failed to spawn dispatch thread: {0}")]
    Spawn(String),
}

impl From<PoolError> for SchedulerError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::PoolStopped => Self::PoolStopped,
            other => Self::Pool(other),
        }
    }
}

/// Failure delivered through a [`ResultHandle`](crate::core::ResultHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The task panicked while running; carries the panic message.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// No outcome arrived within the requested timeout.
    #[error("timed out waiting for task result")]
    Timeout,
    /// The task was dropped without ever running.
    #[error("task abandoned before producing a result")]
    Abandoned,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
