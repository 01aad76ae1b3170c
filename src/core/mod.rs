//! Worker pool, scheduler, and the task plumbing between them.

pub mod error;
pub mod scheduler;
pub mod task;
pub mod worker_pool;

pub use error::{AppResult, PoolError, SchedulerError, TaskError};
pub use scheduler::Scheduler;
pub use task::{ResultHandle, TaskId, TaskResult};
pub use worker_pool::{PoolStats, WorkerPool};
