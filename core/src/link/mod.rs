//! External agent link: the opaque capability that carries out one
//! natural-language instruction against a model-driven browser session.
//!
//! ```text
//! TaskExecutor ──run_task──▶ RetryingLink ──▶ dyn AgentLink (model client + browser session)
//!                               │
//!                               ├─ reconnect when is_connected() == false
//!                               └─ teardown + retry on failure (retries + 1 attempts)
//! ```

mod retry;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LinkError, SetupError};

pub use retry::{RetryingLink, DEFAULT_RETRIES};

/// Connection state of a link as seen by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    Connected,
    Disconnected,
    Closed,
}

/// Capability contract for anything that can run an agent task.
///
/// Implementations own exactly one session at a time and are never shared
/// between executors.
#[async_trait]
pub trait AgentLink: Send {
    fn name(&self) -> &str;

    /// Builds the model client and browser session.
    async fn create(&mut self) -> Result<(), SetupError>;

    /// Runs one instruction and returns the agent history.
    async fn run_task(&mut self, description: &str) -> Result<Value, LinkError>;

    fn is_connected(&self) -> bool;

    /// Releases the session. Calling it on a closed link is a no-op.
    async fn close(&mut self);
}

#[async_trait]
impl<L: AgentLink + ?Sized> AgentLink for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn create(&mut self) -> Result<(), SetupError> {
        (**self).create().await
    }

    async fn run_task(&mut self, description: &str) -> Result<Value, LinkError> {
        (**self).run_task(description).await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}
