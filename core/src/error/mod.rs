#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod template;

pub use error::{LinkError, MonitorError, SetupError};
pub use executor::ExecutorError;
pub use template::TemplateError;
