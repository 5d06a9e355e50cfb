use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_stream::stream;
use futures::Stream;

use crate::error::ExecutorError;
use crate::link::AgentLink;
use crate::monitor::Monitor;

use super::types::{ExecutorConfig, Task, TaskEvent, TaskOutcome, DEFAULT_TIMEOUT_SECS};

pub const CANCELLED_MESSAGE: &str = "task cancelled before completion";

/// Submits instructions to an agent link, bounds each call by a timeout and
/// keeps an ordered log of every task it has seen.
///
/// Task failures and timeouts are never returned as `Err`; they are recorded
/// on the `Task`. Only misuse (a closed executor) or setup problems surface
/// as `ExecutorError`.
pub struct TaskExecutor {
    link: tokio::sync::Mutex<Box<dyn AgentLink>>,
    default_timeout: Duration,
    tasks: Mutex<Vec<Task>>,
    monitor: Option<Arc<Monitor>>,
    closed: AtomicBool,
}

pub struct TaskExecutorBuilder {
    link: Box<dyn AgentLink>,
    default_timeout: Duration,
    monitor: Option<Arc<Monitor>>,
}

impl TaskExecutorBuilder {
    fn new(link: Box<dyn AgentLink>) -> Self {
        Self {
            link,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            monitor: None,
        }
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.default_timeout = timeout;
        }
        self
    }

    pub fn config(self, config: &ExecutorConfig) -> Self {
        self.default_timeout(config.default_timeout())
    }

    pub fn monitor(mut self, monitor: Arc<Monitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn build(self) -> TaskExecutor {
        TaskExecutor {
            link: tokio::sync::Mutex::new(self.link),
            default_timeout: self.default_timeout,
            tasks: Mutex::new(Vec::new()),
            monitor: self.monitor,
            closed: AtomicBool::new(false),
        }
    }
}

impl TaskExecutor {
    pub fn new(link: impl AgentLink + 'static) -> Self {
        Self::builder(link).build()
    }

    pub fn builder(link: impl AgentLink + 'static) -> TaskExecutorBuilder {
        TaskExecutorBuilder::new(Box::new(link))
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn monitor(&self) -> Option<&Arc<Monitor>> {
        self.monitor.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Eagerly builds the link. Without it the link is created on the first
    /// task.
    pub async fn start(&self) -> Result<(), ExecutorError> {
        self.ensure_open()?;
        let mut link = self.link.lock().await;
        link.create().await?;
        tracing::info!(link = link.name(), "Agent link ready");
        Ok(())
    }

    /// Runs one instruction to a terminal status. A `None` or zero timeout
    /// uses the executor default.
    pub async fn execute(
        &self,
        description: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Task, ExecutorError> {
        self.ensure_open()?;
        let description = description.into();
        let pending = self.submit(&description);
        let outcome = self.run_bounded(pending.id, &description, timeout).await;
        Ok(pending.complete(outcome))
    }

    /// Like [`execute`](Self::execute) but yields a `running` event right
    /// after submission and the terminal event once the call settles.
    ///
    /// The task is submitted when this method returns, not on first poll.
    pub fn execute_stream(
        &self,
        description: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<impl Stream<Item = TaskEvent> + Send + '_, ExecutorError> {
        self.ensure_open()?;
        let description = description.into();
        let pending = self.submit(&description);

        Ok(stream! {
            yield TaskEvent::running(pending.id);
            let outcome = self.run_bounded(pending.id, &description, timeout).await;
            let task = pending.complete(outcome);
            yield TaskEvent::from(&task);
        })
    }

    /// Every task submitted so far, in submission order.
    pub fn history(&self) -> Vec<Task> {
        self.tasks().clone()
    }

    pub fn task(&self, id: u64) -> Option<Task> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.tasks().get(index).cloned()
    }

    /// Releases the link. Later calls are no-ops; later submissions fail with
    /// [`ExecutorError::Closed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut link = self.link.lock().await;
        link.close().await;
        tracing::info!(link = link.name(), "Executor closed");
    }

    pub fn export_metrics(&self, path: impl AsRef<Path>) -> Result<(), ExecutorError> {
        let monitor = self.monitor.as_ref().ok_or(ExecutorError::MonitorMissing)?;
        monitor.export(path)?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ExecutorError> {
        if self.is_closed() {
            return Err(ExecutorError::Closed);
        }
        Ok(())
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<Task>> {
        match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Allocates the next id and moves the new task straight to `running`.
    /// Id allocation and the append happen under one lock so the log stays
    /// in id order.
    fn submit(&self, description: &str) -> PendingTask<'_> {
        let mut tasks = self.tasks();
        let id = tasks.len() as u64 + 1;
        let mut task = Task::new(id, description.to_string());
        task.mark_running();
        tasks.push(task);
        drop(tasks);

        tracing::info!(task_id = id, "Task started: {}", description);
        PendingTask {
            executor: self,
            id,
            started: Instant::now(),
            done: false,
        }
    }

    /// Races the link call (including the wait for the link itself) against
    /// the timeout. On timeout the call future is dropped; the link notices
    /// the abandoned call on its next use.
    async fn run_bounded(
        &self,
        task_id: u64,
        description: &str,
        timeout: Option<Duration>,
    ) -> TaskOutcome {
        let bound = timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(self.default_timeout);

        let call = async {
            let mut link = self.link.lock().await;
            let started = Instant::now();
            let result = link.run_task(description).await;
            if let Some(monitor) = &self.monitor {
                monitor.record_model_call(task_id, started.elapsed());
            }
            result
        };

        match tokio::time::timeout(bound, call).await {
            Ok(Ok(history)) => TaskOutcome::Success(history),
            Ok(Err(err)) => TaskOutcome::Failed(err.to_string()),
            Err(_) => {
                tracing::warn!(task_id, "Task exceeded {:?}; abandoning agent call", bound);
                TaskOutcome::TimedOut
            }
        }
    }

    fn finish(&self, id: u64, outcome: TaskOutcome, elapsed: Duration) -> Option<Task> {
        let task = {
            let mut tasks = self.tasks();
            let task = tasks.get_mut((id - 1) as usize)?;
            if !task.finish(outcome) {
                return None;
            }
            task.clone()
        };

        match task.error() {
            None => tracing::info!(task_id = id, "Task succeeded in {:?}", elapsed),
            Some(err) => tracing::warn!(
                task_id = id,
                status = %task.status(),
                "Task ended in {:?}: {}",
                elapsed,
                err
            ),
        }

        if let Some(monitor) = &self.monitor {
            monitor.record_task(&task, elapsed);
        }
        Some(task)
    }
}

/// A submitted task awaiting its outcome. Dropping it unfinished (the
/// caller abandoned `execute` or the stream) records the task as failed.
struct PendingTask<'a> {
    executor: &'a TaskExecutor,
    id: u64,
    started: Instant,
    done: bool,
}

impl PendingTask<'_> {
    fn complete(mut self, outcome: TaskOutcome) -> Task {
        self.done = true;
        let elapsed = self.started.elapsed();
        match self.executor.finish(self.id, outcome, elapsed) {
            Some(task) => task,
            // already terminal: hand back what the log holds
            None => self
                .executor
                .task(self.id)
                .unwrap_or_else(|| Task::new(self.id, String::new())),
        }
    }
}

impl Drop for PendingTask<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.executor.finish(
            self.id,
            TaskOutcome::Failed(CANCELLED_MESSAGE.to_string()),
            self.started.elapsed(),
        );
    }
}
