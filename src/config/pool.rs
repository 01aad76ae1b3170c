//! Worker pool and scheduler configuration structures.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable holding the worker count.
pub const ENV_WORKERS: &str = "TASK_ENGINE_WORKERS";
/// Environment variable holding the work queue capacity.
pub const ENV_QUEUE_SIZE: &str = "TASK_ENGINE_QUEUE_SIZE";
/// Environment variable holding the worker thread stack size in bytes.
pub const ENV_STACK_SIZE: &str = "TASK_ENGINE_STACK_SIZE";

const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 64 * 1024;

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub worker_count: usize,
    /// Maximum number of tasks waiting in the queue. Zero means direct hand-off.
    pub max_queue_size: usize,
    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name_prefix: String,
    /// Stack size for each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let workers = num_cpus::get().max(1);
        Self {
            worker_count: workers,
            max_queue_size: workers * 16,
            thread_name_prefix: "te-worker".into(),
            thread_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with defaults sized to the host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!(
                "thread_stack_size must be at least {MIN_STACK_SIZE} bytes"
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name of the dispatch thread.
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "te-scheduler".into(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.is_empty() {
            return Err("thread_name must not be empty".into());
        }
        Ok(())
    }
}

/// Root configuration for a pool plus the scheduler driving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker pool settings.
    pub pool: WorkerPoolConfig,
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns a description naming the invalid section.
    pub fn validate(&self) -> Result<(), String> {
        self.pool
            .validate()
            .map_err(|e| format!("pool invalid: {e}"))?;
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message naming a variable that failed to parse, or a
    /// validation message.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(workers) = env_var::<usize>(ENV_WORKERS)? {
            cfg.pool.worker_count = workers;
        }
        if let Some(size) = env_var::<usize>(ENV_QUEUE_SIZE)? {
            cfg.pool.max_queue_size = size;
        }
        if let Some(stack) = env_var::<usize>(ENV_STACK_SIZE)? {
            cfg.pool.thread_stack_size = stack;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("{name} is not a valid number: {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = WorkerPoolConfig::default();
        assert!(cfg.worker_count >= 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_sets_fields() {
        let cfg = WorkerPoolConfig::new()
            .with_worker_count(3)
            .with_max_queue_size(0)
            .with_thread_name_prefix("io")
            .with_thread_stack_size(128 * 1024);
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.max_queue_size, 0);
        assert_eq!(cfg.thread_name_prefix, "io");
        assert_eq!(cfg.thread_stack_size, 128 * 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_tiny_stack_rejected() {
        let cfg = WorkerPoolConfig::new().with_thread_stack_size(1024);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unset_env_var_keeps_default() {
        let value = env_var::<usize>("TASK_ENGINE_UNSET_FOR_TEST").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_non_numeric_env_var_rejected() {
        let name = "TASK_ENGINE_NON_NUMERIC_FOR_TEST";
        env::set_var(name, "plenty");
        let result = env_var::<usize>(name);
        env::remove_var(name);

        let err = result.unwrap_err();
        assert!(err.contains(name), "error does not name the variable: {err}");
        assert!(err.contains("plenty"));
    }

    #[test]
    fn test_env_var_value_is_trimmed() {
        let name = "TASK_ENGINE_PADDED_FOR_TEST";
        env::set_var(name, " 8 ");
        let result = env_var::<usize>(name);
        env::remove_var(name);

        assert_eq!(result, Ok(Some(8)));
    }
}
