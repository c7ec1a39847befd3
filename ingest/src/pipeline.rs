use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use ingest_config::shared::PipelineConfig;
use metrics::{counter, histogram};
use tokio::pin;
use tracing::info;

use crate::bail;
use crate::client::LoadClient;
use crate::concurrency::shutdown::{ShutdownResult, ShutdownTx, create_shutdown_channel};
use crate::concurrency::stream::BatchStream;
use crate::error::{ErrorKind, IngestResult};
use crate::loader::StreamingBulkLoader;
use crate::mapper::RowMapper;
use crate::metrics::{
    CLIENT_LABEL, INGEST_BATCH_LOAD_DURATION_SECONDS, INGEST_BATCHES_LOADED_TOTAL,
    INGEST_ROWS_LOADED_TOTAL, PIPELINE_ID_LABEL, TABLE_LABEL,
};
use crate::types::TableName;

/// Identifier for one pipeline instance.
pub type PipelineId = u64;

/// Outcome of a pipeline run.
#[derive(Debug)]
pub enum IngestOutcome {
    /// All input records were loaded.
    Completed {
        /// Total number of rows the store reported across all batches.
        total_rows: u64,
        /// Row count reported for each batch, in batch order.
        batch_counts: Vec<u64>,
    },
    /// The run was interrupted by a shutdown signal.
    ///
    /// Rows buffered in an unfinished batch are not loaded and must be considered
    /// unwritten.
    Shutdown,
}

/// A batching bulk-load pipeline from input records to a destination table.
///
/// The pipeline maps each input record to a row, groups rows into bounded batches, and
/// streams every batch into the store's bulk-load command. Row counts reported by the
/// store are collected per batch; the first failure aborts the run. Batches are loaded
/// one at a time, so a single store connection is never shared between in-flight loads.
#[derive(Debug)]
pub struct Pipeline<M, C> {
    config: Arc<PipelineConfig>,
    mapper: M,
    client: C,
    shutdown_tx: ShutdownTx,
}

impl<M, C> Pipeline<M, C>
where
    C: LoadClient + Clone + Send + Sync + 'static,
{
    /// Creates a new pipeline after validating `config`.
    ///
    /// Validation happens here, before any record is processed: an invalid configuration
    /// (zero batch size, zero pipe buffer, empty table name) fails construction with
    /// [`ErrorKind::ConfigError`] and nothing is ever executed.
    pub fn new(config: PipelineConfig, mapper: M, client: C) -> IngestResult<Self> {
        if let Err(validation_error) = config.validate() {
            bail!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                validation_error
            );
        }

        // We create a watch channel of unit types since this is just used to notify all
        // subscribers that shutdown is needed.
        let (shutdown_tx, _) = create_shutdown_channel();

        Ok(Self {
            config: Arc::new(config),
            mapper,
            client,
            shutdown_tx,
        })
    }

    /// Returns the id of this pipeline.
    pub fn id(&self) -> PipelineId {
        self.config.id
    }

    /// Returns a handle that requests a graceful stop of a running pipeline at the next
    /// batch boundary.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Runs the pipeline over `records` until the stream ends, a failure occurs, or
    /// shutdown is requested.
    pub async fn run<T, S>(&self, records: S) -> IngestResult<IngestOutcome>
    where
        S: Stream<Item = T>,
        M: RowMapper<T>,
    {
        info!(
            pipeline_id = self.config.id,
            table = %self.config.table,
            batch_max_size = self.config.batch.max_size,
            "starting bulk-load pipeline"
        );

        let loader = StreamingBulkLoader::new(
            self.client.clone(),
            TableName::new(self.config.table.clone()),
            self.config.pipe.buffer_bytes,
        );

        let rows = records.map(|record| self.mapper.map_row(record));
        let batches = BatchStream::wrap(
            rows,
            self.config.batch.clone(),
            self.shutdown_tx.subscribe(),
        );
        pin!(batches);

        let mut total_rows: u64 = 0;
        let mut batch_counts = Vec::new();

        while let Some(result) = batches.next().await {
            match result {
                ShutdownResult::Ok(rows) => {
                    let rows = rows.into_iter().collect::<Result<Vec<_>, _>>()?;

                    let before_load = Instant::now();

                    let row_count = loader.load_batch(rows).await?;

                    counter!(
                        INGEST_ROWS_LOADED_TOTAL,
                        PIPELINE_ID_LABEL => self.config.id.to_string(),
                        TABLE_LABEL => self.config.table.clone(),
                        CLIENT_LABEL => C::name(),
                    )
                    .increment(row_count);
                    counter!(
                        INGEST_BATCHES_LOADED_TOTAL,
                        PIPELINE_ID_LABEL => self.config.id.to_string(),
                        TABLE_LABEL => self.config.table.clone(),
                        CLIENT_LABEL => C::name(),
                    )
                    .increment(1);

                    let load_duration_seconds = before_load.elapsed().as_secs_f64();
                    histogram!(
                        INGEST_BATCH_LOAD_DURATION_SECONDS,
                        PIPELINE_ID_LABEL => self.config.id.to_string(),
                        TABLE_LABEL => self.config.table.clone(),
                        CLIENT_LABEL => C::name(),
                    )
                    .record(load_duration_seconds);

                    total_rows += row_count;
                    batch_counts.push(row_count);
                }
                ShutdownResult::Shutdown(_) => {
                    info!(
                        pipeline_id = self.config.id,
                        total_rows, "shutting down bulk-load pipeline"
                    );

                    return Ok(IngestOutcome::Shutdown);
                }
            }
        }

        info!(
            pipeline_id = self.config.id,
            total_rows,
            batches = batch_counts.len(),
            "completed bulk-load pipeline"
        );

        Ok(IngestOutcome::Completed {
            total_rows,
            batch_counts,
        })
    }
}
