pub mod strategies;

pub use strategies::{ExponentialBackoffStrategy, LinearRetryStrategy};
