//! Configuration types for bulk-load ingestion pipelines.

pub mod shared;
