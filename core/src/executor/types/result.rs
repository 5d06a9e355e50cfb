use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::task::{Task, TaskStatus};

pub const TIMEOUT_MESSAGE: &str = "Task timed out";

/// How a bounded agent call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The link returned within the bound; carries the agent history.
    Success(Value),
    /// The link reported a failure (after its own retries).
    Failed(String),
    /// The bound elapsed first. The abandoned call may still be running.
    TimedOut,
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Success(_) => TaskStatus::Success,
            Self::Failed(_) => TaskStatus::Failed,
            Self::TimedOut => TaskStatus::Timeout,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failed(msg) => Some(msg),
            Self::TimedOut => Some(TIMEOUT_MESSAGE),
        }
    }
}

/// Result payload of a successful task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub success: bool,
    pub history: Value,
}

/// Progress notification produced by `TaskExecutor::execute_stream`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskEvent {
    pub task_id: u64,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskEvent {
    pub fn running(task_id: u64) -> Self {
        Self {
            task_id,
            status: TaskStatus::Running,
            history: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl From<&Task> for TaskEvent {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            status: task.status(),
            history: task.result().map(|r| r.history),
            error: task.error().map(str::to_string),
        }
    }
}
