use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::result::{TaskOutcome, TaskResult};

/// Lifecycle status of a task. Progresses strictly forward:
/// `pending -> running -> {success, failed, timeout}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Timeout)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted instruction and its lifecycle record.
///
/// Tasks are created and mutated only by the executor that owns them;
/// callers receive clones and read them through accessors.
#[derive(Debug, Clone)]
pub struct Task {
    id: u64,
    description: String,
    status: TaskStatus,
    outcome: Option<TaskOutcome>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn new(id: u64, description: String) -> Self {
        Self {
            id,
            description,
            status: TaskStatus::Pending,
            outcome: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// `pending -> running`. Returns false if the task already left `pending`.
    pub(crate) fn mark_running(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Moves the task into the terminal status matching `outcome`.
    /// A terminal task is never touched again; returns false in that case.
    pub(crate) fn finish(&mut self, outcome: TaskOutcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let now = Utc::now();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.status = outcome.status();
        self.outcome = Some(outcome);
        self.finished_at = Some(now);
        true
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<&TaskOutcome> {
        self.outcome.as_ref()
    }

    /// Present iff the task succeeded.
    pub fn result(&self) -> Option<TaskResult> {
        match &self.outcome {
            Some(TaskOutcome::Success(history)) => Some(TaskResult {
                success: true,
                history: history.clone(),
            }),
            _ => None,
        }
    }

    /// Present iff the task failed or timed out.
    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(TaskOutcome::error_message)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// `finished_at - started_at`, once terminal.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
            result: self.result(),
            error: self.error().map(str::to_string),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

/// Flat, serializable view of a [`Task`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: u64,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_task_is_pending_without_result_or_error() {
        let task = Task::new(1, "open example.com".into());
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.result().is_none());
        assert!(task.error().is_none());
        assert!(task.started_at().is_none());
    }

    #[test]
    fn success_carries_result_only() {
        let mut task = Task::new(1, "search".into());
        assert!(task.mark_running());
        assert!(task.finish(TaskOutcome::Success(json!(["done"]))));

        assert_eq!(task.status(), TaskStatus::Success);
        let result = task.result().unwrap();
        assert!(result.success);
        assert_eq!(result.history, json!(["done"]));
        assert!(task.error().is_none());
        assert!(task.finished_at().is_some());
    }

    #[test]
    fn timeout_carries_error_only() {
        let mut task = Task::new(2, "slow".into());
        task.mark_running();
        task.finish(TaskOutcome::TimedOut);

        assert_eq!(task.status(), TaskStatus::Timeout);
        assert_eq!(task.error(), Some("Task timed out"));
        assert!(task.result().is_none());
    }

    #[test]
    fn terminal_task_is_frozen() {
        let mut task = Task::new(3, "x".into());
        task.mark_running();
        task.finish(TaskOutcome::Failed("boom".into()));
        let finished = task.finished_at();

        assert!(!task.finish(TaskOutcome::Success(json!(null))));
        assert!(!task.mark_running());
        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.error(), Some("boom"));
        assert_eq!(task.finished_at(), finished);
    }

    #[test]
    fn running_cannot_go_back_to_running() {
        let mut task = Task::new(4, "x".into());
        assert!(task.mark_running());
        let started = task.started_at();
        assert!(!task.mark_running());
        assert_eq!(task.started_at(), started);
    }

    #[test]
    fn serializes_as_flat_record() {
        let mut task = Task::new(7, "ping".into());
        task.mark_running();
        task.finish(TaskOutcome::Failed("boom".into()));

        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["id"], 7);
        assert_eq!(v["status"], "failed");
        assert_eq!(v["error"], "boom");
        assert!(v.get("result").is_none());
    }
}
