pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod link;
pub mod monitor;
pub mod template;
