//! # Prometheus Task Engine
//!
//! A bounded worker pool and a time-ordered scheduler for background work in
//! the Prometheus AI Platform.
//!
//! The engine has two layers. The [`WorkerPool`](core::WorkerPool) runs
//! closures on a fixed set of OS threads fed by a bounded FIFO queue; when
//! the queue is full, submitters block until a worker frees a slot. The
//! [`Scheduler`](core::Scheduler) sits on top and turns immediate, delayed,
//! and periodic requests into pool submissions at the right time.
//!
//! ## Key Features
//!
//! - **Backpressure**: producers block instead of growing the queue without bound
//! - **Ordering**: FIFO in the pool; due time then insertion order in the scheduler
//! - **Panic isolation**: a failing task reports through its handle and the worker lives on
//! - **Clean shutdown**: queued pool work drains, blocked producers are released,
//!   and no thread is left behind
//!
//! ## WorkerPool
//!
//! ```rust
//! use prometheus_task_engine::core::WorkerPool;
//!
//! // 4 workers, at most 32 tasks waiting
//! let pool = WorkerPool::with_capacity(4, 32)?;
//!
//! let handle = pool.submit(|| "inference done".to_string())?;
//! assert_eq!(handle.get()?, "inference done");
//!
//! pool.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Scheduler
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_task_engine::core::{Scheduler, WorkerPool};
//!
//! let pool = Arc::new(WorkerPool::with_capacity(2, 16)?);
//! let scheduler = Scheduler::new(Arc::clone(&pool))?;
//!
//! scheduler.post_after(Duration::from_millis(100), || println!("warm cache"))?;
//! scheduler.post_every(Duration::from_secs(1), || println!("heartbeat"))?;
//!
//! scheduler.shutdown();
//! pool.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For complete examples, see:
//! - `tests/worker_pool_test.rs` - pool integration tests
//! - `tests/scheduler_test.rs` - scheduler timing and shutdown tests

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Worker pool, scheduler, task handles, and errors.
pub mod core;
/// Configuration models for the pool and scheduler.
pub mod config;
/// Builders to construct engine components from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
