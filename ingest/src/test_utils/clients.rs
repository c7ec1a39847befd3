//! Fault-injecting load clients.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;

use crate::client::LoadClient;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;

/// Load client that stops reading mid-stream.
///
/// Reads at most `limit_bytes` from the bound stream, then drops it and reports a row
/// count as if the load had succeeded. Dropping the stream while the writer is still
/// producing makes the writer fail with a broken pipe, which the loader must turn into a
/// batch failure despite the reported count.
#[derive(Debug, Clone)]
pub struct TruncatingLoadClient {
    limit_bytes: usize,
    loads: Arc<Mutex<u64>>,
}

impl TruncatingLoadClient {
    /// Creates a client that reads at most `limit_bytes` per load.
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            limit_bytes,
            loads: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of load commands executed.
    pub async fn load_count(&self) -> u64 {
        *self.loads.lock().await
    }
}

impl LoadClient for TruncatingLoadClient {
    fn name() -> &'static str {
        "truncating"
    }

    async fn execute_load<R>(&self, _command: &str, mut data: R) -> IngestResult<u64>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut buffer = vec![0u8; self.limit_bytes];
        let mut read = 0;
        while read < self.limit_bytes {
            let n = data.read(&mut buffer[read..]).await?;
            if n == 0 {
                break;
            }
            read += n;
        }
        drop(data);

        let mut loads = self.loads.lock().await;
        *loads += 1;

        Ok(1)
    }
}

/// Load client whose load command always fails.
///
/// The bound stream is dropped without being read, as a store would abandon the upload
/// after rejecting the command.
#[derive(Debug, Clone)]
pub struct FailingLoadClient;

impl LoadClient for FailingLoadClient {
    fn name() -> &'static str {
        "failing"
    }

    async fn execute_load<R>(&self, _command: &str, data: R) -> IngestResult<u64>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        drop(data);

        Err(ingest_error!(
            ErrorKind::DestinationQueryFailed,
            "Load command rejected by the store"
        ))
    }
}
