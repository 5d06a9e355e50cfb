use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use taskpilot_core::config::AppConfig;
use taskpilot_core::executor::{
    execute_partitioned, format_report, format_task, OutputFormat, ProgressMonitor, Task,
    TaskExecutor, TaskStatus,
};
use taskpilot_plugins::factory;

use super::cli::BatchArgs;
use super::{export_metrics, EXIT_SUCCESS, EXIT_TASK_FAILED, EXIT_TASK_TIMEOUT};
use crate::error::CliError;

pub async fn batch(args: BatchArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    args.agent.apply(&mut cfg);
    let format: OutputFormat = args.format.into();

    let mut descriptions = match &args.file {
        Some(path) => read_task_file(path)?,
        None => Vec::new(),
    };
    descriptions.extend(args.tasks.iter().cloned());
    if descriptions.is_empty() {
        return Err(CliError::Usage(
            "no tasks given; use --file or --task".to_string(),
        ));
    }

    let parallel = args
        .parallel
        .unwrap_or(cfg.executor.max_parallel)
        .clamp(1, descriptions.len());
    let timeout = args.timeout.map(Duration::from_secs);

    let monitor = factory::build_monitor(&cfg);
    let executors: Vec<TaskExecutor> = (0..parallel)
        .map(|_| factory::build_executor(&cfg, monitor.clone()))
        .collect();
    tracing::info!(
        tasks = descriptions.len(),
        agents = parallel,
        "Starting batch"
    );

    let result = run_batch(&descriptions, &executors, timeout, format).await;
    futures::future::join_all(executors.iter().map(|e| e.close())).await;
    let tasks = result?;

    if let Some(monitor) = &monitor {
        println!("{}", format_report(format, &monitor.report()));
    }
    if let Some(first) = executors.first() {
        export_metrics(first, cfg.monitor.export_path.as_deref())?;
    }

    Ok(batch_exit_code(&tasks))
}

async fn run_batch(
    descriptions: &[String],
    executors: &[TaskExecutor],
    timeout: Option<Duration>,
    format: OutputFormat,
) -> Result<Vec<Task>, CliError> {
    futures::future::try_join_all(executors.iter().map(|e| e.start())).await?;

    let progress = Mutex::new(ProgressMonitor::new(descriptions.len(), !format.is_json()));
    if let Ok(mut p) = progress.lock() {
        for (i, d) in descriptions.iter().enumerate() {
            p.add_task(i, d);
        }
    }

    let tasks = execute_partitioned(descriptions, executors, timeout, |index, task| {
        if format.is_json() {
            println!("{}", format_task(format, task));
        }
        if let Ok(mut p) = progress.lock() {
            let ms = task
                .duration()
                .map(|d| d.num_milliseconds().max(0) as u64)
                .unwrap_or(0);
            p.complete_task(index, &descriptions[index], task.status(), ms);
        }
    })
    .await?;

    if let Ok(p) = progress.lock() {
        p.finish(tasks.iter().all(|t| t.status() == TaskStatus::Success));
    }
    if !format.is_json() {
        for task in &tasks {
            println!("{}", format_task(format, task));
        }
    }
    Ok(tasks)
}

/// Non-empty, non-comment lines.
fn read_task_file(path: &Path) -> Result<Vec<String>, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn batch_exit_code(tasks: &[Task]) -> i32 {
    if tasks.iter().any(|t| t.status() == TaskStatus::Failed) {
        EXIT_TASK_FAILED
    } else if tasks.iter().any(|t| t.status() == TaskStatus::Timeout) {
        EXIT_TASK_TIMEOUT
    } else {
        EXIT_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn task_file_skips_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# shopping\nCompare laptop prices\n\n  Find rust news  \n").unwrap();

        let tasks = read_task_file(file.path()).unwrap();
        assert_eq!(tasks, vec!["Compare laptop prices", "Find rust news"]);
    }

    #[test]
    fn empty_batch_exits_successfully() {
        assert_eq!(batch_exit_code(&[]), EXIT_SUCCESS);
    }
}
