//! Test helpers for exercising ingestion pipelines.
//!
//! Only available in tests or with the `test-utils` feature enabled. All helpers are
//! injected per test run; the production core carries no global test state.

pub mod clients;
pub mod rows;
pub mod tracing;
