use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tracing::info;

use crate::client::LoadClient;
use crate::error::IngestResult;
use crate::escape::{FIELD_DELIMITER, ROW_DELIMITER, unescape_field};

#[derive(Debug)]
struct Inner {
    commands: Vec<String>,
    loads: Vec<Vec<Vec<String>>>,
}

/// In-memory load client for testing and development purposes.
///
/// [`MemoryLoadClient`] consumes each bound stream fully, parses the tab-separated wire
/// format back into rows, and remembers the executed command text alongside the rows of
/// every load. The reported row count is the number of parsed rows, mirroring what the
/// store would report for a clean load. All data is held in memory and lost when the
/// client is dropped.
#[derive(Debug, Clone)]
pub struct MemoryLoadClient {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLoadClient {
    /// Creates a new empty memory load client.
    pub fn new() -> Self {
        let inner = Inner {
            commands: Vec::new(),
            loads: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns the command text of every load executed so far, in execution order.
    pub async fn commands(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.commands.clone()
    }

    /// Returns the parsed rows of every load, one group per executed command.
    pub async fn loads(&self) -> Vec<Vec<Vec<String>>> {
        let inner = self.inner.lock().await;
        inner.loads.clone()
    }

    /// Returns all parsed rows across loads, in arrival order.
    pub async fn rows(&self) -> Vec<Vec<String>> {
        let inner = self.inner.lock().await;
        inner.loads.iter().flatten().cloned().collect()
    }

    /// Returns the number of load commands executed.
    pub async fn load_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.loads.len()
    }

    /// Clears all captured commands and rows.
    ///
    /// This method is useful for resetting the client state between tests.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.commands.clear();
        inner.loads.clear();
    }
}

impl Default for MemoryLoadClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the tab-separated wire format into rows of unescaped field values.
fn parse_rows(data: &[u8]) -> IngestResult<Vec<Vec<String>>> {
    let text = std::str::from_utf8(data)?;

    let rows = text
        .split(ROW_DELIMITER as char)
        .filter(|row| !row.is_empty())
        .map(|row| {
            row.split(FIELD_DELIMITER as char)
                .map(unescape_field)
                .collect()
        })
        .collect();

    Ok(rows)
}

impl LoadClient for MemoryLoadClient {
    fn name() -> &'static str {
        "memory"
    }

    async fn execute_load<R>(&self, command: &str, mut data: R) -> IngestResult<u64>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes).await?;

        let rows = parse_rows(&bytes)?;
        let row_count = rows.len() as u64;

        info!("loaded a batch of {} rows", row_count);

        let mut inner = self.inner.lock().await;
        inner.commands.push(command.to_string());
        inner.loads.push(rows);

        Ok(row_count)
    }
}
