use std::future::Future;

use tokio::io::AsyncRead;

use crate::error::IngestResult;

/// Trait for store connections that can execute a streaming bulk load.
///
/// [`LoadClient`] implementations bind the provided byte stream as the local input of a
/// bulk-load command and execute the command against the store, reading the stream until
/// end-of-file. The returned value is the row count the store reported for the load.
///
/// A client is driven by at most one in-flight load at a time; the pipeline never shares
/// a connection across concurrently loading batches.
pub trait LoadClient {
    /// Returns the name of the client, used in logs and metric labels.
    fn name() -> &'static str;

    /// Executes `command` against the store with `data` bound as the command's local
    /// input stream.
    ///
    /// Implementations must drain `data` to end-of-file while the command runs: the
    /// writer side of the stream blocks on a bounded pipe and only makes progress while
    /// the command consumes bytes.
    fn execute_load<R>(
        &self,
        command: &str,
        data: R,
    ) -> impl Future<Output = IngestResult<u64>> + Send
    where
        R: AsyncRead + Send + Unpin + 'static;
}
