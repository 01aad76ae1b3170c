//! Tests for error types

use prometheus_task_engine::core::{PoolError, SchedulerError, TaskError};

#[test]
fn test_pool_stopped_error() {
    let err = PoolError::PoolStopped;
    assert_eq!(format!("{}", err), "worker pool stopped");
}

#[test]
fn test_invalid_config_error() {
    let err = PoolError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_invalid_argument_error() {
    let err = SchedulerError::InvalidArgument("interval is zero".to_string());
    assert_eq!(format!("{}", err), "invalid argument: interval is zero");
}

#[test]
fn test_task_panicked_error() {
    let err = TaskError::Panicked("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "task panicked: index out of bounds");
}

#[test]
fn test_task_timeout_error() {
    assert_eq!(
        format!("{}", TaskError::Timeout),
        "timed out waiting for task result"
    );
}

#[test]
fn test_pool_error_converts_to_scheduler_error() {
    let err: SchedulerError = PoolError::PoolStopped.into();
    assert_eq!(err, SchedulerError::PoolStopped);

    let err: SchedulerError = PoolError::Spawn("resource unavailable".into()).into();
    assert!(matches!(err, SchedulerError::Pool(PoolError::Spawn(_))));
}

#[test]
fn test_errors_work_with_anyhow() {
    fn fails() -> prometheus_task_engine::core::AppResult<()> {
        Err(TaskError::Abandoned.into())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "task abandoned before producing a result");
}
