//! Task execution core
//!
//! ```text
//! execute(description, timeout?)
//!   ↓
//! submit → Task { id = n + 1, status = running }   (appended to history)
//!   ↓
//! tokio::time::timeout(bound, link.run_task(description))
//!   ↓
//! Success(history) | Failed(error) | TimedOut
//!   ↓
//! Task { status ∈ success/failed/timeout, finished_at } → Monitor::record_task
//! ```
//!
//! `execute_partitioned` fans a batch out over several independent
//! executors, one sequential queue each.

mod engine;
mod output;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{TaskExecutor, TaskExecutorBuilder, CANCELLED_MESSAGE};
pub use output::{format_event, format_report, format_task, OutputFormat};
pub use progress::ProgressMonitor;
pub use scheduler::execute_partitioned;
pub use types::{
    ExecutorConfig, RetryConfig, Task, TaskEvent, TaskOutcome, TaskRecord, TaskResult, TaskStatus,
    TIMEOUT_MESSAGE,
};
