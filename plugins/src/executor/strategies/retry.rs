use std::time::Duration;

use taskpilot_core::executor::traits::RetryStrategy;
use taskpilot_core::executor::types::RetryConfig;

pub struct ExponentialBackoffStrategy {
    config: RetryConfig,
}

pub struct LinearRetryStrategy {
    config: RetryConfig,
}

impl ExponentialBackoffStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetryStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

/// Model-side rejections that another attempt will not fix.
fn is_permanent(error: &str) -> bool {
    let lower = error.to_ascii_lowercase();
    lower.contains("model not found") || lower.contains("invalid api key")
}

impl RetryStrategy for ExponentialBackoffStrategy {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Duration {
        let exp = 1u64 << attempt.saturating_sub(1).min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    fn is_fatal_error(&self, error: &str) -> bool {
        is_permanent(error)
    }
}

impl RetryStrategy for LinearRetryStrategy {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Duration {
        let multiplier = attempt.max(1) as u64;
        let delay = self.config.base_delay_ms.saturating_mul(multiplier);
        let delay = delay.min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    fn is_fatal_error(&self, error: &str) -> bool {
        is_permanent(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(base: u64, max: u64, strategy: &str) -> RetryConfig {
        RetryConfig {
            retries: 3,
            strategy: strategy.to_string(),
            base_delay_ms: base,
            max_delay_ms: max,
        }
    }

    #[test]
    fn test_exponential_backoff() {
        let strategy = ExponentialBackoffStrategy::new(cfg(100, 1000, "exponential-backoff"));
        assert_eq!(strategy.next_delay(1, "err").as_millis(), 100);
        assert_eq!(strategy.next_delay(2, "err").as_millis(), 200);
        assert_eq!(strategy.next_delay(3, "err").as_millis(), 400);
        assert_eq!(strategy.next_delay(10, "err").as_millis(), 1000);
    }

    #[test]
    fn test_linear_backoff() {
        let strategy = LinearRetryStrategy::new(cfg(50, 200, "linear"));
        assert_eq!(strategy.next_delay(1, "err").as_millis(), 50);
        assert_eq!(strategy.next_delay(3, "err").as_millis(), 150);
        assert_eq!(strategy.next_delay(9, "err").as_millis(), 200);
    }

    #[test]
    fn missing_model_is_fatal() {
        let strategy = LinearRetryStrategy::new(cfg(0, 0, "linear"));
        assert!(strategy.is_fatal_error("Model not found: deepseek"));
        assert!(!strategy.is_fatal_error("connection reset"));
    }
}
