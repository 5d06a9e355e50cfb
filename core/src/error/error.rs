use thiserror::Error;

/// Raised when the agent link cannot be brought up.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("model backend unavailable: {0}")]
    Model(String),
    #[error("browser session failed to start: {0}")]
    Browser(String),
    #[error("setup io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised by a single agent run, or by the retry wrapper once attempts are exhausted.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{0}")]
    Run(String),
    #[error("link setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("browser driver protocol error: {0}")]
    Protocol(String),
    #[error("link is closed; call create() before running tasks")]
    Closed,
}

impl LinkError {
    /// Errors that no amount of retrying will fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("metrics io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metrics encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
