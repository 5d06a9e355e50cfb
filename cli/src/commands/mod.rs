pub mod batch;
pub mod cli;
pub mod run;
pub mod template;

use std::collections::HashMap;
use std::path::Path;

use taskpilot_core::executor::{TaskExecutor, TaskStatus};
use taskpilot_core::template::TemplateLibrary;

use crate::error::CliError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_TASK_FAILED: i32 = 2;
pub const EXIT_TASK_TIMEOUT: i32 = 3;

pub fn exit_code_for_status(status: TaskStatus) -> i32 {
    match status {
        TaskStatus::Success => EXIT_SUCCESS,
        TaskStatus::Timeout => EXIT_TASK_TIMEOUT,
        _ => EXIT_TASK_FAILED,
    }
}

/// Parses repeated `KEY=VALUE` flags.
pub fn parse_vars(raw: &[String]) -> Result<HashMap<String, String>, CliError> {
    raw.iter()
        .map(|kv| {
            let (k, v) = kv
                .split_once('=')
                .ok_or_else(|| CliError::Usage(format!("expected KEY=VALUE, got `{kv}`")))?;
            let k = k.trim();
            if k.is_empty() {
                return Err(CliError::Usage(format!("empty variable name in `{kv}`")));
            }
            Ok((k.to_string(), v.to_string()))
        })
        .collect()
}

/// Built-in catalog, with templates from `extra` layered on top.
pub fn load_library(extra: Option<&Path>) -> Result<TemplateLibrary, CliError> {
    let mut lib = TemplateLibrary::builtin();
    if let Some(path) = extra {
        let data = std::fs::read_to_string(path)?;
        lib.merge(TemplateLibrary::import_json(&data)?);
        tracing::debug!(path = %path.display(), "Loaded template library");
    }
    Ok(lib)
}

/// Writes metrics if an export path is configured.
pub fn export_metrics(executor: &TaskExecutor, path: Option<&str>) -> Result<(), CliError> {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return Ok(());
    };
    executor.export_metrics(path)?;
    eprintln!("📁 Metrics written to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let vars = parse_vars(&["topic=AI".into(), "query=a=b".into()]).unwrap();
        assert_eq!(vars["topic"], "AI");
        assert_eq!(vars["query"], "a=b");
        assert!(parse_vars(&["novalue".into()]).is_err());
        assert!(parse_vars(&["=x".into()]).is_err());
    }

    #[test]
    fn status_exit_codes() {
        assert_eq!(exit_code_for_status(TaskStatus::Success), 0);
        assert_eq!(exit_code_for_status(TaskStatus::Failed), 2);
        assert_eq!(exit_code_for_status(TaskStatus::Timeout), 3);
    }

    #[test]
    fn library_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.json");
        std::fs::write(
            &path,
            r#"[{"name":"monitoring","content":"Watch {keyword} closely","version":2}]"#,
        )
        .unwrap();

        let lib = load_library(Some(path.as_path())).unwrap();
        assert_eq!(lib.get("monitoring").unwrap().content, "Watch {keyword} closely");
        assert!(lib.get("data_scrape").is_ok());
    }
}
