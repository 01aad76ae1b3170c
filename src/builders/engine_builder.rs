//! Build a pool and its scheduler from an [`EngineConfig`].

use std::sync::Arc;

use tracing::info;

use crate::config::EngineConfig;
use crate::core::{PoolError, Scheduler, SchedulerError, WorkerPool};

/// A worker pool together with the scheduler feeding it.
#[derive(Debug)]
pub struct Engine {
    scheduler: Scheduler,
    pool: Arc<WorkerPool>,
}

impl Engine {
    /// The worker pool, for direct submissions.
    #[must_use]
    pub const fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// The scheduler, for immediate, delayed, and periodic work.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Stop the scheduler, then drain and stop the pool.
    ///
    /// Stopping the scheduler first keeps it from submitting into a pool
    /// that is already refusing work. Idempotent.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        self.pool.shutdown();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Build an engine from configuration.
///
/// # Errors
///
/// - `SchedulerError::Pool` wrapping `PoolError::InvalidConfig` or
///   `PoolError::Spawn` if the pool could not be built
/// - `SchedulerError::InvalidArgument` or `SchedulerError::Spawn` if the
///   scheduler could not be built
pub fn build_engine(cfg: &EngineConfig) -> Result<Engine, SchedulerError> {
    cfg.pool
        .validate()
        .map_err(|e| SchedulerError::Pool(PoolError::InvalidConfig(e)))?;
    cfg.scheduler
        .validate()
        .map_err(SchedulerError::InvalidArgument)?;

    let pool = Arc::new(WorkerPool::new(cfg.pool.clone())?);
    let scheduler = Scheduler::with_config(Arc::clone(&pool), cfg.scheduler.clone())?;

    info!(
        worker_count = cfg.pool.worker_count,
        max_queue_size = cfg.pool.max_queue_size,
        "Engine built"
    );

    Ok(Engine { scheduler, pool })
}
