use std::time::Duration;

/// Retry delay policy used by `RetryingLink` between failed attempts.
///
/// The number of attempts is fixed by the link's `retries` setting; the
/// strategy only decides how long to wait and whether an error is worth
/// retrying at all.
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    fn next_delay(&self, attempt: u32, error: &str) -> Duration;

    fn is_fatal_error(&self, _error: &str) -> bool {
        false
    }
}

/// Retries straight away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateRetry;

impl RetryStrategy for ImmediateRetry {
    fn name(&self) -> &str {
        "immediate"
    }

    fn next_delay(&self, _attempt: u32, _error: &str) -> Duration {
        Duration::ZERO
    }
}
