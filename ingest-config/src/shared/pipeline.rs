use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, PipeConfig, ValidationError};

/// Configuration for a bulk-load ingestion pipeline.
///
/// Contains all settings required to run one pipeline: the destination table,
/// batch sizing, and the buffering of the pipe used while streaming batches to
/// the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The unique identifier for this pipeline.
    ///
    /// Used to tell concurrently running pipelines apart in logs and metrics.
    pub id: u64,
    /// Name of the destination table receiving the bulk-loaded rows.
    pub table: String,
    /// Batch sizing configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Pipe buffering configuration.
    #[serde(default)]
    pub pipe: PipeConfig,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    ///
    /// Checks the destination table name and delegates to the nested batch and
    /// pipe validations. Meant to be called once, before any record is
    /// processed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.table.is_empty() {
            return Err(ValidationError::TableEmpty);
        }

        self.batch.validate()?;
        self.pipe.validate()?;

        Ok(())
    }
}
