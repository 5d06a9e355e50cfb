use thiserror::Error;

use super::error::{MonitorError, SetupError};

/// Hard failures of the executor itself. Ordinary task failures never
/// surface here; they are recorded on the returned `Task`.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("executor is closed")]
    Closed,

    #[error("agent setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("metrics export failed: {0}")]
    Metrics(#[from] MonitorError),

    #[error("no monitor attached to this executor")]
    MonitorMissing,

    #[error("fan-out needs at least one executor")]
    NoExecutors,
}
