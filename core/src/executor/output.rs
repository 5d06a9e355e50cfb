use std::fmt;
use std::str::FromStr;

use crate::monitor::MonitorReport;

use super::types::{Task, TaskEvent, TaskStatus};

/// How results are written to stdout. `Json` emits one JSON object per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "·",
        TaskStatus::Running => "⏳",
        TaskStatus::Success => "✅",
        TaskStatus::Failed => "❌",
        TaskStatus::Timeout => "⏱",
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error":"{e}"}}"#))
}

/// Render a stream event
pub fn format_event(format: OutputFormat, event: &TaskEvent) -> String {
    match format {
        OutputFormat::Json => to_json(event),
        OutputFormat::Text => match (&event.history, &event.error) {
            (_, Some(err)) => format!(
                "{} Task {} {}: {}",
                status_icon(event.status),
                event.task_id,
                event.status,
                err
            ),
            (Some(history), None) => format!(
                "{} Task {} {}: {}",
                status_icon(event.status),
                event.task_id,
                event.status,
                history
            ),
            (None, None) => format!(
                "{} Task {} {}",
                status_icon(event.status),
                event.task_id,
                event.status
            ),
        },
    }
}

/// Render a finished task
pub fn format_task(format: OutputFormat, task: &Task) -> String {
    match format {
        OutputFormat::Json => to_json(task),
        OutputFormat::Text => {
            let duration = task
                .duration()
                .map(|d| format!(" ({}ms)", d.num_milliseconds()))
                .unwrap_or_default();
            let mut out = format!(
                "{} Task {} [{}]{}: {}",
                status_icon(task.status()),
                task.id(),
                task.status(),
                duration,
                task.description()
            );
            if let Some(result) = task.result() {
                out.push_str(&format!("\n   history: {}", result.history));
            }
            if let Some(err) = task.error() {
                out.push_str(&format!("\n   error: {}", err));
            }
            out
        }
    }
}

/// Render the monitor summary
pub fn format_report(format: OutputFormat, report: &MonitorReport) -> String {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Text => {
            let mut out = format!(
                "📊 {} tasks, success rate {:.1}%, avg duration {:.2}s",
                report.total,
                report.success_rate * 100.0,
                report.avg_duration
            );
            for err in &report.errors {
                out.push_str(&format!("\n   - {}", err));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn json_event_is_single_line() {
        let event = TaskEvent {
            task_id: 3,
            status: TaskStatus::Success,
            history: Some(json!(["step"])),
            error: None,
        };
        let line = format_event(OutputFormat::Json, &event);
        assert!(!line.contains('\n'));
        let back: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(back["status"], "success");
        assert!(back.get("error").is_none());
    }

    #[test]
    fn text_report_lists_errors() {
        let report = MonitorReport {
            total: 2,
            success_rate: 0.5,
            avg_duration: 1.25,
            errors: vec!["Task timed out".into()],
        };
        let text = format_report(OutputFormat::Text, &report);
        assert!(text.contains("50.0%"));
        assert!(text.contains("Task timed out"));
    }
}
