pub mod browser_agent;

pub use browser_agent::{BrowserAgentLink, HEADLESS_ENV};
