//! Tests for configuration validation

use prometheus_task_engine::config::{EngineConfig, SchedulerConfig, WorkerPoolConfig};

#[test]
fn test_pool_config_validation() {
    let valid = WorkerPoolConfig::new()
        .with_worker_count(4)
        .with_max_queue_size(50);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_pool_config_zero_queue_is_handoff() {
    let handoff = WorkerPoolConfig::new()
        .with_worker_count(1)
        .with_max_queue_size(0);
    assert!(handoff.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_worker_count() {
    let invalid = WorkerPoolConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_thread_prefix() {
    let invalid = WorkerPoolConfig::new().with_thread_name_prefix("");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_thread_name() {
    let invalid = SchedulerConfig {
        thread_name: String::new(),
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_from_json() {
    let json = r#"{
        "pool": {
            "worker_count": 3,
            "max_queue_size": 12,
            "thread_name_prefix": "inference"
        },
        "scheduler": {
            "thread_name": "inference-timer"
        }
    }"#;

    let config = EngineConfig::from_json_str(json).expect("Failed to parse");
    assert_eq!(config.pool.worker_count, 3);
    assert_eq!(config.pool.max_queue_size, 12);
    assert_eq!(config.pool.thread_name_prefix, "inference");
    assert_eq!(config.pool.thread_stack_size, WorkerPoolConfig::default().thread_stack_size);
    assert_eq!(config.scheduler.thread_name, "inference-timer");
}

#[test]
fn test_engine_config_from_json_defaults() {
    let config = EngineConfig::from_json_str("{}").expect("Failed to parse");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_engine_config_from_json_rejects_invalid() {
    let json = r#"{ "pool": { "worker_count": 0 } }"#;
    let err = EngineConfig::from_json_str(json).unwrap_err();
    assert!(err.starts_with("pool invalid"), "unexpected error: {err}");
}

#[test]
fn test_engine_config_from_json_rejects_malformed() {
    let err = EngineConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_engine_config_round_trips_through_json() {
    let config = EngineConfig {
        pool: WorkerPoolConfig::new().with_worker_count(2).with_max_queue_size(0),
        scheduler: SchedulerConfig::default(),
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
}
