use std::time::Duration;

use futures::StreamExt;
use taskpilot_core::config::AppConfig;
use taskpilot_core::executor::{format_event, format_report, format_task, OutputFormat, TaskStatus};
use taskpilot_plugins::factory;

use super::cli::RunArgs;
use super::{exit_code_for_status, export_metrics, load_library, parse_vars};
use crate::error::CliError;

pub async fn run(args: RunArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    args.agent.apply(&mut cfg);
    let description = resolve_description(&args)?;
    let format: OutputFormat = args.format.into();
    let timeout = args.timeout.map(Duration::from_secs);

    let executor = factory::build_executor(&cfg, factory::build_monitor(&cfg));
    executor.start().await?;

    let status = if args.stream {
        let events = executor.execute_stream(description, timeout)?;
        futures::pin_mut!(events);
        let mut last = TaskStatus::Failed;
        while let Some(event) = events.next().await {
            println!("{}", format_event(format, &event));
            last = event.status;
        }
        last
    } else {
        let task = executor.execute(description, timeout).await?;
        println!("{}", format_task(format, &task));
        task.status()
    };

    if let Some(monitor) = executor.monitor() {
        if !format.is_json() {
            eprintln!("{}", format_report(format, &monitor.report()));
        }
    }
    let exported = export_metrics(&executor, cfg.monitor.export_path.as_deref());
    executor.close().await;
    exported?;

    Ok(exit_code_for_status(status))
}

fn resolve_description(args: &RunArgs) -> Result<String, CliError> {
    match (&args.description, &args.template) {
        (Some(d), None) if !d.trim().is_empty() => Ok(d.clone()),
        (None, Some(name)) => {
            let lib = load_library(args.library.as_deref())?;
            let vars = parse_vars(&args.vars)?;
            Ok(lib.render(name, &vars)?)
        }
        _ => Err(CliError::Usage(
            "provide a task DESCRIPTION or --template NAME".to_string(),
        )),
    }
}
