//! Configuration objects for ingestion pipelines.
//!
//! This module contains re-exported configurations that are needed by the pipeline.

// Re-exports.
pub use ingest_config::shared::*;
