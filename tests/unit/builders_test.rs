//! Tests for engine builders

use std::sync::mpsc;
use std::time::Duration;

use prometheus_task_engine::builders::build_engine;
use prometheus_task_engine::config::EngineConfig;

#[test]
fn test_built_engine_runs_scheduled_work() {
    let config = EngineConfig::from_json_str(r#"{ "pool": { "worker_count": 2, "max_queue_size": 8 } }"#)
        .expect("Failed to parse");
    let engine = build_engine(&config).expect("Failed to build engine");

    let (tx, rx) = mpsc::channel();
    engine
        .scheduler()
        .post_after(Duration::from_millis(10), move || {
            let _ = tx.send("scheduled");
        })
        .expect("Failed to post");

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok("scheduled"));

    engine.shutdown();
    engine.shutdown();
    assert!(engine.pool().submit(|| ()).is_err());
}
