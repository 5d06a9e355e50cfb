mod load;
mod types;

pub use load::{
    apply_env_overrides, get_taskpilot_data_dir, load_default, load_file_config, load_from_path,
    ENV_BROWSER_CMD, ENV_HEADLESS, ENV_MODEL, ENV_OLLAMA_URL, ENV_TIMEOUT_SECS,
};
pub use types::{AgentConfig, AppConfig, ExecutorConfig, LoggingConfig, MonitorConfig, RetryConfig};
