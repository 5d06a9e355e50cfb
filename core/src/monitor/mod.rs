//! Passive metrics recorder shared by one or more executors.
//!
//! All mutation goes through `&self` methods guarded by a mutex, so a single
//! `Arc<Monitor>` can be handed to several executors running concurrently.

mod sampler;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::executor::types::{Task, TaskStatus};

pub use sampler::ResourceSampler;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSample {
    pub cpu: f32,
    pub memory: f32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskMetric {
    pub task_id: u64,
    pub description: String,
    pub status: TaskStatus,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelCallMetric {
    pub task_id: u64,
    pub duration: f64,
}

/// Everything the monitor has accumulated. Durations are in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonitorMetrics {
    pub tasks_total: u64,
    pub tasks_success: u64,
    pub tasks_failed: u64,
    pub tasks_timeout: u64,
    pub durations: Vec<f64>,
    pub errors: Vec<String>,
    pub resource_usage: Vec<ResourceSample>,
    #[serde(default)]
    pub tasks: Vec<TaskMetric>,
    #[serde(default)]
    pub model_calls: Vec<ModelCallMetric>,
}

/// Point-in-time summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorReport {
    pub total: u64,
    pub success_rate: f64,
    pub avg_duration: f64,
    pub errors: Vec<String>,
}

#[derive(Serialize)]
struct MetricsExport<'a> {
    #[serde(flatten)]
    metrics: &'a MonitorMetrics,
    generated_at: DateTime<Utc>,
}

pub struct Monitor {
    metrics: Mutex<MonitorMetrics>,
    sampler: Mutex<ResourceSampler>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(MonitorMetrics::default()),
            sampler: Mutex::new(ResourceSampler::new()),
        }
    }

    pub fn record_task(&self, task: &Task, duration: Duration) {
        let seconds = duration.as_secs_f64();
        let (cpu, memory) = lock(&self.sampler).sample();

        let mut m = lock(&self.metrics);
        m.tasks_total += 1;
        match task.status() {
            TaskStatus::Success => m.tasks_success += 1,
            TaskStatus::Failed => m.tasks_failed += 1,
            TaskStatus::Timeout => m.tasks_timeout += 1,
            TaskStatus::Pending | TaskStatus::Running => {}
        }
        m.durations.push(seconds);
        if let Some(err) = task.error() {
            m.errors.push(err.to_string());
        }
        m.resource_usage.push(ResourceSample {
            cpu,
            memory,
            timestamp: Utc::now(),
        });
        m.tasks.push(TaskMetric {
            task_id: task.id(),
            description: task.description().to_string(),
            status: task.status(),
            duration: seconds,
            error: task.error().map(str::to_string),
        });

        tracing::debug!(
            task_id = task.id(),
            status = %task.status(),
            "Recorded task ({:.3}s)",
            seconds
        );
    }

    pub fn record_model_call(&self, task_id: u64, duration: Duration) {
        lock(&self.metrics).model_calls.push(ModelCallMetric {
            task_id,
            duration: duration.as_secs_f64(),
        });
        tracing::debug!(task_id, "Recorded model call");
    }

    pub fn report(&self) -> MonitorReport {
        let m = lock(&self.metrics);
        let success_rate = if m.tasks_total == 0 {
            0.0
        } else {
            m.tasks_success as f64 / m.tasks_total as f64
        };
        let avg_duration = if m.durations.is_empty() {
            0.0
        } else {
            m.durations.iter().sum::<f64>() / m.durations.len() as f64
        };

        MonitorReport {
            total: m.tasks_total,
            success_rate,
            avg_duration,
            errors: m.errors.clone(),
        }
    }

    /// Snapshot of the accumulated metrics.
    pub fn metrics(&self) -> MonitorMetrics {
        lock(&self.metrics).clone()
    }

    /// Writes the full metrics document as pretty JSON, replacing `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), MonitorError> {
        let path = path.as_ref();
        let json = {
            let m = lock(&self.metrics);
            serde_json::to_string_pretty(&MetricsExport {
                metrics: &m,
                generated_at: Utc::now(),
            })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Exported metrics");
        Ok(())
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
