pub mod client;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod escape;
pub mod loader;
mod macros;
pub mod mapper;
pub mod metrics;
pub mod pipeline;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
