pub mod browser;

pub use browser::{BrowserSession, BrowserSessionArgs, DriverReply, DriverRequest, LlmSpec};
