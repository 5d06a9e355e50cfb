use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LinkError, SetupError};
use crate::executor::traits::{ImmediateRetry, RetryStrategy};

use super::{AgentLink, LinkState};

pub const DEFAULT_RETRIES: u32 = 1;

/// Adds reconnect-on-disconnect and bounded retry around a single agent call.
///
/// A disconnected session is never retried in place: it is torn down and
/// rebuilt. The same applies to a session whose previous call was abandoned
/// mid-flight (the caller dropped the future, e.g. on timeout), since its
/// state is unknown.
pub struct RetryingLink<L> {
    inner: L,
    retries: u32,
    strategy: Arc<dyn RetryStrategy>,
    state: LinkState,
    interrupted: bool,
}

impl<L: AgentLink> RetryingLink<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            retries: DEFAULT_RETRIES,
            strategy: Arc::new(ImmediateRetry),
            state: LinkState::Uninitialized,
            interrupted: false,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Drops the current session so the next attempt starts clean.
    async fn teardown(&mut self) {
        self.inner.close().await;
        self.interrupted = false;
        if self.state != LinkState::Closed {
            self.state = LinkState::Uninitialized;
        }
    }

    async fn ensure_ready(&mut self) -> Result<(), SetupError> {
        if self.interrupted {
            tracing::warn!(
                link = self.inner.name(),
                "previous call was abandoned before completing; rebuilding session"
            );
            self.teardown().await;
        }

        if self.inner.is_connected() {
            self.state = LinkState::Connected;
            return Ok(());
        }

        if self.state == LinkState::Connected {
            tracing::warn!(link = self.inner.name(), "agent link disconnected; reconnecting");
            self.state = LinkState::Disconnected;
        }

        self.inner.close().await;
        self.inner.create().await?;
        self.state = LinkState::Connected;
        Ok(())
    }

    async fn attempt(&mut self, description: &str) -> Result<Value, LinkError> {
        self.ensure_ready().await?;

        self.interrupted = true;
        let result = self.inner.run_task(description).await;
        self.interrupted = false;
        result
    }
}

#[async_trait]
impl<L: AgentLink> AgentLink for RetryingLink<L> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn create(&mut self) -> Result<(), SetupError> {
        self.interrupted = false;
        match self.inner.create().await {
            Ok(()) => {
                self.state = LinkState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = LinkState::Uninitialized;
                Err(err)
            }
        }
    }

    async fn run_task(&mut self, description: &str) -> Result<Value, LinkError> {
        if self.state == LinkState::Closed {
            return Err(LinkError::Closed);
        }

        let max_attempts = self.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let err = match self.attempt(description).await {
                Ok(history) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "agent run succeeded after retry");
                    }
                    return Ok(history);
                }
                Err(err) => err,
            };

            self.teardown().await;

            let message = err.to_string();
            if attempt >= max_attempts || err.is_fatal() || self.strategy.is_fatal_error(&message)
            {
                tracing::error!(
                    attempts = attempt,
                    link = self.inner.name(),
                    "agent run failed: {}",
                    message
                );
                return Err(err);
            }

            let delay = self.strategy.next_delay(attempt, &message);
            tracing::warn!(
                attempt,
                max_attempts,
                strategy = self.strategy.name(),
                "agent run failed, retrying in {:?}: {}",
                delay,
                message
            );
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.state == LinkState::Connected && self.inner.is_connected()
    }

    async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.inner.close().await;
        self.interrupted = false;
        self.state = LinkState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Default)]
    struct Counters {
        creates: AtomicU32,
        runs: AtomicU32,
        closes: AtomicU32,
        connected: AtomicBool,
    }

    struct ScriptedLink {
        script: VecDeque<Result<Value, String>>,
        counters: Arc<Counters>,
    }

    impl ScriptedLink {
        fn new(script: Vec<Result<Value, String>>) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            (
                Self {
                    script: script.into(),
                    counters: counters.clone(),
                },
                counters,
            )
        }
    }

    #[async_trait]
    impl AgentLink for ScriptedLink {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn create(&mut self) -> Result<(), SetupError> {
            self.counters.creates.fetch_add(1, Ordering::SeqCst);
            self.counters.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn run_task(&mut self, _description: &str) -> Result<Value, LinkError> {
            self.counters.runs.fetch_add(1, Ordering::SeqCst);
            match self.script.pop_front() {
                Some(Ok(v)) => Ok(v),
                Some(Err(e)) => Err(LinkError::Run(e)),
                None => Err(LinkError::Run("script exhausted".into())),
            }
        }

        fn is_connected(&self) -> bool {
            self.counters.connected.load(Ordering::SeqCst)
        }

        async fn close(&mut self) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            self.counters.connected.store(false, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn retry_then_success_makes_two_attempts() {
        let (inner, counters) = ScriptedLink::new(vec![Err("fail".into()), Ok(json!(["ok"]))]);
        let mut link = RetryingLink::new(inner);
        link.create().await.unwrap();

        let history = link.run_task("retry").await.unwrap();

        assert_eq!(history, json!(["ok"]));
        assert_eq!(counters.runs.load(Ordering::SeqCst), 2);
        // the failed attempt tears the session down, the retry rebuilds it
        assert_eq!(counters.creates.load(Ordering::SeqCst), 2);
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[tokio::test]
    async fn exhaustion_propagates_last_failure() {
        let (inner, counters) = ScriptedLink::new(vec![
            Err("first".into()),
            Err("second".into()),
            Err("never reached".into()),
        ]);
        let mut link = RetryingLink::new(inner).with_retries(1);

        let err = link.run_task("always fails").await.unwrap_err();

        assert_eq!(err.to_string(), "second");
        assert_eq!(counters.runs.load(Ordering::SeqCst), 2);
        assert_eq!(link.state(), LinkState::Uninitialized);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let (inner, counters) = ScriptedLink::new(vec![Err("boom".into()), Ok(json!(1))]);
        let mut link = RetryingLink::new(inner).with_retries(0);

        assert!(link.run_task("once").await.is_err());
        assert_eq!(counters.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnects_once_when_disconnected() {
        let (inner, counters) = ScriptedLink::new(vec![Ok(json!(["done"]))]);
        let mut link = RetryingLink::new(inner);
        link.create().await.unwrap();
        assert_eq!(counters.creates.load(Ordering::SeqCst), 1);

        // simulate lost browser connection
        counters.connected.store(false, Ordering::SeqCst);
        assert!(!link.is_connected());

        let history = link.run_task("reconnect").await.unwrap();

        assert_eq!(history, json!(["done"]));
        assert_eq!(counters.creates.load(Ordering::SeqCst), 2);
        assert_eq!(counters.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lazily_creates_on_first_run() {
        let (inner, counters) = ScriptedLink::new(vec![Ok(json!("x"))]);
        let mut link = RetryingLink::new(inner);
        assert_eq!(link.state(), LinkState::Uninitialized);

        link.run_task("lazy").await.unwrap();

        assert_eq!(counters.creates.load(Ordering::SeqCst), 1);
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[tokio::test]
    async fn closed_link_refuses_until_recreated() {
        let (inner, counters) = ScriptedLink::new(vec![Ok(json!("after reopen"))]);
        let mut link = RetryingLink::new(inner);
        link.create().await.unwrap();
        link.close().await;
        link.close().await;

        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(matches!(link.run_task("x").await, Err(LinkError::Closed)));
        assert_eq!(counters.runs.load(Ordering::SeqCst), 0);

        link.create().await.unwrap();
        assert_eq!(link.run_task("x").await.unwrap(), json!("after reopen"));
    }

    #[tokio::test]
    async fn abandoned_call_forces_rebuild() {
        struct Hanging {
            counters: Arc<Counters>,
            hang_first: bool,
        }

        #[async_trait]
        impl AgentLink for Hanging {
            fn name(&self) -> &str {
                "hanging"
            }
            async fn create(&mut self) -> Result<(), SetupError> {
                self.counters.creates.fetch_add(1, Ordering::SeqCst);
                self.counters.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            async fn run_task(&mut self, _d: &str) -> Result<Value, LinkError> {
                self.counters.runs.fetch_add(1, Ordering::SeqCst);
                if std::mem::take(&mut self.hang_first) {
                    futures::future::pending::<()>().await;
                }
                Ok(json!("fresh"))
            }
            fn is_connected(&self) -> bool {
                self.counters.connected.load(Ordering::SeqCst)
            }
            async fn close(&mut self) {
                self.counters.connected.store(false, Ordering::SeqCst);
            }
        }

        let counters = Arc::new(Counters::default());
        let mut link = RetryingLink::new(Hanging {
            counters: counters.clone(),
            hang_first: true,
        });
        link.create().await.unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), link.run_task("stuck")).await;
        assert!(abandoned.is_err());

        assert_eq!(link.run_task("next").await.unwrap(), json!("fresh"));
        assert_eq!(counters.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        struct Fatal;
        impl RetryStrategy for Fatal {
            fn name(&self) -> &str {
                "fatal"
            }
            fn next_delay(&self, _attempt: u32, _error: &str) -> Duration {
                Duration::ZERO
            }
            fn is_fatal_error(&self, error: &str) -> bool {
                error.contains("quota")
            }
        }

        let (inner, counters) = ScriptedLink::new(vec![Err("quota exceeded".into()), Ok(json!(1))]);
        let mut link = RetryingLink::new(inner)
            .with_retries(3)
            .with_strategy(Arc::new(Fatal));

        assert!(link.run_task("x").await.is_err());
        assert_eq!(counters.runs.load(Ordering::SeqCst), 1);
    }
}
