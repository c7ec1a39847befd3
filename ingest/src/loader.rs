use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::LoadClient;
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::escape::escape_row_into;
use crate::ingest_error;
use crate::types::{MappedRow, TableName};

/// Placeholder file name spliced into the load command.
///
/// The store requires a file name in the command text even though the data arrives
/// through the bound stream; the name itself is never opened.
const INFILE_PLACEHOLDER: &str = "###.tsv";

/// Orchestrates the bulk load of single batches.
///
/// For every batch, a writer task streams the escaped rows into one end of a bounded
/// in-process pipe while the store executes the load command reading from the other end.
/// The two sides must run concurrently: the pipe is bounded, so the writer blocks once
/// it is full and only makes progress while the command drains bytes.
#[derive(Debug)]
pub struct StreamingBulkLoader<C> {
    client: C,
    table: TableName,
    pipe_buffer_bytes: usize,
}

impl<C> StreamingBulkLoader<C>
where
    C: LoadClient,
{
    /// Creates a loader that loads batches into `table` through `client`.
    pub fn new(client: C, table: TableName, pipe_buffer_bytes: usize) -> Self {
        Self {
            client,
            table,
            pipe_buffer_bytes,
        }
    }

    /// Returns the command text used for every batch of this loader.
    pub fn command(&self) -> String {
        format!(
            "LOAD DATA LOCAL INFILE '{}' INTO TABLE {}",
            INFILE_PLACEHOLDER,
            self.table.quoted()
        )
    }

    /// Loads one batch and returns the row count reported by the store.
    ///
    /// The reported count is surfaced only after the writer task has been joined without
    /// error. A writer failure means the transmitted data may be truncated, so it turns
    /// the whole batch into a failure even when the load command nominally returned a
    /// count.
    pub async fn load_batch(&self, batch: Vec<MappedRow>) -> IngestResult<u64> {
        let (reader, mut writer) = tokio::io::duplex(self.pipe_buffer_bytes);

        let writer_task = tokio::spawn(async move {
            let mut buf = BytesMut::new();
            for row in &batch {
                escape_row_into(&mut buf, row);
                writer.write_all(&buf).await?;
                buf.clear();
            }

            // Closing our end signals end-of-stream to the load command.
            writer.shutdown().await?;

            Ok::<(), std::io::Error>(())
        });

        let command = self.command();
        let load_result = self.client.execute_load(&command, reader).await;

        // The writer is joined only after the load command has returned: the pipe is
        // bounded, so joining first could wait forever on a writer that is itself
        // waiting for the command to drain bytes. If the command (or its caller)
        // dropped the read half early, the writer unblocks with a broken pipe and the
        // join still completes.
        let writer_result = match writer_task.await {
            Ok(result) => result,
            Err(join_error) => {
                return Err(ingest_error!(
                    ErrorKind::WriterTaskPanic,
                    "Batch writer task terminated abnormally",
                    join_error
                ));
            }
        };

        match (load_result, writer_result) {
            (Ok(row_count), Ok(())) => {
                debug!(rows = row_count, "bulk load completed");

                Ok(row_count)
            }
            (Ok(_), Err(io_error)) => Err(transmission_error(io_error)),
            (Err(load_error), Ok(())) => Err(load_error),
            (Err(load_error), Err(io_error)) => {
                Err(vec![load_error, transmission_error(io_error)].into())
            }
        }
    }
}

/// Converts a captured writer-side I/O error into a batch failure.
fn transmission_error(io_error: std::io::Error) -> IngestError {
    ingest_error!(
        ErrorKind::DestinationIoError,
        "I/O failure while streaming batch data to the store",
        detail = io_error.to_string(),
        source: io_error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryLoadClient;
    use crate::test_utils::rows::expected_rows;

    fn test_batch(count: u64) -> Vec<MappedRow> {
        (0..count)
            .map(|id| MappedRow::new(vec![id.to_string(), format!("Testval{id}")]))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loads_a_batch_and_reports_the_store_count() {
        let client = MemoryLoadClient::new();
        let loader = StreamingBulkLoader::new(client.clone(), TableName::new("t"), 524_288);

        let row_count = loader.load_batch(test_batch(3)).await.unwrap();

        assert_eq!(row_count, 3);
        assert_eq!(client.load_count().await, 1);
        assert_eq!(client.rows().await, expected_rows(3));
    }

    #[test]
    fn command_text_contains_quoted_table() {
        let loader =
            StreamingBulkLoader::new(MemoryLoadClient::new(), TableName::new("we`ird"), 1024);

        assert_eq!(
            loader.command(),
            "LOAD DATA LOCAL INFILE '###.tsv' INTO TABLE `we``ird`"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tiny_pipe_buffer_still_transfers_the_whole_batch() {
        let client = MemoryLoadClient::new();
        // A pipe far smaller than the batch forces the writer to block repeatedly and
        // exercises the backpressure path.
        let loader = StreamingBulkLoader::new(client.clone(), TableName::new("t"), 16);

        let row_count = loader.load_batch(test_batch(500)).await.unwrap();

        assert_eq!(row_count, 500);
        assert_eq!(client.rows().await, expected_rows(500));
    }
}
