//! Metrics definitions for ingestion pipeline monitoring.

/// Label for pipeline ID in metrics.
pub const PIPELINE_ID_LABEL: &str = "pipeline_id";

/// Label for destination table in metrics.
pub const TABLE_LABEL: &str = "table";

/// Label for the load client implementation in metrics.
pub const CLIENT_LABEL: &str = "client";

// Load metrics

/// Counter for total rows loaded into the destination table.
pub const INGEST_ROWS_LOADED_TOTAL: &str = "ingest_rows_loaded_total";

/// Counter for total bulk-load commands executed.
pub const INGEST_BATCHES_LOADED_TOTAL: &str = "ingest_batches_loaded_total";

/// Histogram for per-batch load durations.
pub const INGEST_BATCH_LOAD_DURATION_SECONDS: &str = "ingest_batch_load_duration_seconds";
