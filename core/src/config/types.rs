use serde::{Deserialize, Serialize};

pub use crate::executor::types::{ExecutorConfig, RetryConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskpilot_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Model client and browser driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Browser driver executable. It must speak the line-delimited JSON
    /// protocol on stdin/stdout.
    #[serde(default = "default_browser_cmd")]
    pub browser_cmd: String,

    #[serde(default)]
    pub browser_args: Vec<String>,

    /// How long the driver has to report ready after launch.
    #[serde(default = "default_setup_timeout_ms")]
    pub setup_timeout_ms: u64,

    /// Fail setup when the model is not installed on the Ollama server.
    #[serde(default = "default_verify_model")]
    pub verify_model: bool,
}

fn default_model_name() -> String {
    "deepseek".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_headless() -> bool {
    true
}

fn default_browser_cmd() -> String {
    "taskpilot-driver".to_string()
}

fn default_setup_timeout_ms() -> u64 {
    30_000
}

fn default_verify_model() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            headless: default_headless(),
            browser_cmd: default_browser_cmd(),
            browser_args: Vec::new(),
            setup_timeout_ms: default_setup_timeout_ms(),
            verify_model: default_verify_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_enabled")]
    pub enabled: bool,

    /// Where metrics are written after a run, if anywhere.
    #[serde(default)]
    pub export_path: Option<String>,
}

fn default_monitor_enabled() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_monitor_enabled(),
            export_path: None,
        }
    }
}
