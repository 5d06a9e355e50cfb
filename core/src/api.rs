//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskpilot_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_file_config, load_from_path, AgentConfig, AppConfig,
    ExecutorConfig, LoggingConfig, MonitorConfig, RetryConfig,
};
pub use crate::error::{ExecutorError, LinkError, MonitorError, SetupError, TemplateError};
pub use crate::executor::traits::{ImmediateRetry, RetryStrategy};
pub use crate::executor::{
    execute_partitioned, format_event, format_report, format_task, OutputFormat,
    ProgressMonitor, Task, TaskEvent, TaskExecutor, TaskExecutorBuilder, TaskOutcome, TaskRecord,
    TaskResult, TaskStatus, CANCELLED_MESSAGE, TIMEOUT_MESSAGE,
};
pub use crate::link::{AgentLink, LinkState, RetryingLink, DEFAULT_RETRIES};
pub use crate::monitor::{Monitor, MonitorMetrics, MonitorReport, ResourceSample};
pub use crate::template::{TaskTemplate, TemplateLibrary};
