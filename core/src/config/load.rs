use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

pub const ENV_MODEL: &str = "TASKPILOT_MODEL";
pub const ENV_OLLAMA_URL: &str = "TASKPILOT_OLLAMA_URL";
pub const ENV_HEADLESS: &str = "TASKPILOT_HEADLESS";
pub const ENV_BROWSER_CMD: &str = "TASKPILOT_BROWSER_CMD";
pub const ENV_TIMEOUT_SECS: &str = "TASKPILOT_TIMEOUT_SECS";

/// Get the default taskpilot data directory: ~/.taskpilot
pub fn get_taskpilot_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".taskpilot"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

/// Resolves the config file without environment overrides.
///
/// Priority: `explicit` path, then `~/.taskpilot/config.toml`, then
/// `./taskpilot.toml`, then built-in defaults.
pub fn load_file_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let user_config = get_taskpilot_data_dir()
        .map(|d| d.join("config.toml"))
        .ok()
        .filter(|p| p.exists());
    let local_config = Path::new("taskpilot.toml");

    if let Some(path) = user_config {
        load_from_path(&path)
    } else if local_config.exists() {
        load_from_path(local_config)
    } else {
        Ok(AppConfig::default())
    }
}

/// [`load_file_config`] followed by [`apply_env_overrides`] on the process
/// environment.
///
/// Rejected values are logged, so install a subscriber first if they
/// should be visible.
pub fn load_default(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = load_file_config(explicit)?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Applies `TASKPILOT_*` overrides. Blank values are skipped; unparsable
/// values are logged and returned by key.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut rejected = Vec::new();

    if let Some(v) = get(ENV_MODEL) {
        cfg.agent.model_name = v;
    }
    if let Some(v) = get(ENV_OLLAMA_URL) {
        cfg.agent.ollama_url = v;
    }
    if let Some(v) = get(ENV_BROWSER_CMD) {
        cfg.agent.browser_cmd = v;
    }
    if let Some(v) = get(ENV_HEADLESS) {
        match parse_bool(&v) {
            Some(b) => cfg.agent.headless = b,
            None => {
                tracing::warn!("ignoring {}={}: expected a boolean", ENV_HEADLESS, v);
                rejected.push(ENV_HEADLESS);
            }
        }
    }
    if let Some(v) = get(ENV_TIMEOUT_SECS) {
        match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => cfg.executor.default_timeout_secs = secs,
            _ => {
                tracing::warn!("ignoring {}={}: expected seconds > 0", ENV_TIMEOUT_SECS, v);
                rejected.push(ENV_TIMEOUT_SECS);
            }
        }
    }

    rejected
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
