use taskpilot_core::error::{ExecutorError, TemplateError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Executor(#[from] ExecutorError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Command(String),
}

impl CliError {
    /// Process exit code for a hard failure. Task outcomes use 0/2/3 and
    /// never reach here.
    pub fn exit_code(&self) -> i32 {
        // 11: config error
        // 12: bad arguments / template input
        // 20: agent setup or IO error
        // 50: internal/uncategorized
        match self {
            Self::Config(_) => 11,
            Self::Usage(_) | Self::Template(_) => 12,
            Self::Executor(ExecutorError::Setup(_)) => 20,
            Self::Executor(_) => 50,
            Self::Io(_) | Self::Command(_) => 20,
        }
    }
}
