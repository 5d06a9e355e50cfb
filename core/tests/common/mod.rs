#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskpilot_core::api::{AgentLink, LinkError, SetupError};

/// One scripted reply of a [`FakeLink`].
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: Result<Value, String>,
}

impl Step {
    pub fn ok(history: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(history),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
pub struct LinkStats {
    pub creates: AtomicU32,
    pub runs: AtomicU32,
    pub closes: AtomicU32,
    pub connected: AtomicBool,
}

impl LinkStats {
    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// In-process agent link double. Replies come from the script first, then
/// from the fallback step, and otherwise echo the description back.
pub struct FakeLink {
    steps: VecDeque<Step>,
    fallback: Option<Step>,
    setup_error: Option<String>,
    stats: Arc<LinkStats>,
}

impl FakeLink {
    pub fn echo() -> Self {
        Self {
            steps: VecDeque::new(),
            fallback: None,
            setup_error: None,
            stats: Arc::new(LinkStats::default()),
        }
    }

    pub fn script(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            ..Self::echo()
        }
    }

    pub fn always(step: Step) -> Self {
        Self {
            fallback: Some(step),
            ..Self::echo()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self::always(Step::ok(json!(["slow"])).after(delay))
    }

    pub fn failing_setup(message: &str) -> Self {
        Self {
            setup_error: Some(message.to_string()),
            ..Self::echo()
        }
    }

    pub fn stats(&self) -> Arc<LinkStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl AgentLink for FakeLink {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create(&mut self) -> Result<(), SetupError> {
        self.stats.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.setup_error {
            return Err(SetupError::Browser(msg.clone()));
        }
        self.stats.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn run_task(&mut self, description: &str) -> Result<Value, LinkError> {
        self.stats.runs.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.pop_front().or_else(|| self.fallback.clone());
        match step {
            None => Ok(json!({ "task": description })),
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.result.map_err(LinkError::Run)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stats.connected.load(Ordering::SeqCst)
    }

    async fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.stats.connected.store(false, Ordering::SeqCst);
    }
}
