use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::types::TaskStatus;

/// Terminal progress display for batch runs
///
/// One overall bar plus a spinner per in-flight task. Hidden when output is
/// machine-readable.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<usize, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_tasks` - Number of instructions in the batch
    /// * `enabled` - Whether to draw anything (disabled for json output)
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));

        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    /// Show a spinner for the instruction at input position `index`
    pub fn add_task(&mut self, index: usize, label: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(format!("⏳ {}", truncate(label, 60)));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(index, bar);
    }

    pub fn complete_task(&mut self, index: usize, label: &str, status: TaskStatus, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(&index) {
            let icon = match status {
                TaskStatus::Success => "✅",
                TaskStatus::Timeout => "⏱",
                _ => "❌",
            };
            bar.finish_with_message(format!(
                "{} {} ({}ms)",
                icon,
                truncate(label, 60),
                duration_ms
            ));
        }

        self.overall.inc(1);
    }

    pub fn finish(&self, all_succeeded: bool) {
        if !self.enabled {
            return;
        }

        let msg = if all_succeeded {
            "✅ All tasks completed"
        } else {
            "❌ Some tasks did not succeed"
        };

        self.overall.finish_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
