use std::sync::Arc;

use taskpilot_core::config::{AppConfig, RetryConfig};
use taskpilot_core::executor::traits::{ImmediateRetry, RetryStrategy};
use taskpilot_core::executor::TaskExecutor;
use taskpilot_core::link::RetryingLink;
use taskpilot_core::monitor::Monitor;

use crate::agent::BrowserAgentLink;
use crate::executor::{ExponentialBackoffStrategy, LinearRetryStrategy};

pub fn build_retry_strategy(cfg: &RetryConfig) -> Arc<dyn RetryStrategy> {
    match cfg.strategy.as_str() {
        "linear" => Arc::new(LinearRetryStrategy::new(cfg.clone())),
        "exponential-backoff" | "exponential" => {
            Arc::new(ExponentialBackoffStrategy::new(cfg.clone()))
        }
        "immediate" => Arc::new(ImmediateRetry),
        other => {
            tracing::warn!("unknown retry strategy '{}', retrying immediately", other);
            Arc::new(ImmediateRetry)
        }
    }
}

pub fn build_link(cfg: &AppConfig) -> RetryingLink<BrowserAgentLink> {
    RetryingLink::new(BrowserAgentLink::new(cfg.agent.clone()))
        .with_retries(cfg.retry.retries)
        .with_strategy(build_retry_strategy(&cfg.retry))
}

/// One executor with its own link. Each call yields an independent
/// executor; share `monitor` to aggregate metrics across them.
pub fn build_executor(cfg: &AppConfig, monitor: Option<Arc<Monitor>>) -> TaskExecutor {
    let builder = TaskExecutor::builder(build_link(cfg)).config(&cfg.executor);
    match monitor {
        Some(monitor) => builder.monitor(monitor).build(),
        None => builder.build(),
    }
}

/// The monitor to attach, if metrics are enabled.
pub fn build_monitor(cfg: &AppConfig) -> Option<Arc<Monitor>> {
    cfg.monitor.enabled.then(|| Arc::new(Monitor::new()))
}
