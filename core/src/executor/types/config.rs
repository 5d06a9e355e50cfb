use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Bound applied to a task when `execute` is called without a timeout.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Number of independent executors used by fan-out runs.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl ExecutorConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs.max(1))
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            max_parallel: default_max_parallel(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_parallel() -> usize {
    3
}

/// Retry behaviour of the agent link wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first one; `1` means at most two calls.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            strategy: default_retry_strategy(),
            base_delay_ms: 0,
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_retries() -> u32 {
    1
}

fn default_retry_strategy() -> String {
    "immediate".to_string()
}

fn default_max_delay_ms() -> u64 {
    5000
}
