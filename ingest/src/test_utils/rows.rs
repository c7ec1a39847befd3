//! Deterministic row fixtures for pipeline tests.

use futures::Stream;
use futures::stream;

use crate::error::IngestResult;
use crate::types::MappedRow;

/// Returns a stream of `count` sequential record ids, starting at zero.
pub fn record_stream(count: u64) -> impl Stream<Item = u64> {
    stream::iter(0..count)
}

/// Maps a record id to its deterministic two-column row.
pub fn map_test_record(id: u64) -> IngestResult<MappedRow> {
    Ok(MappedRow::new(vec![id.to_string(), test_value(id)]))
}

/// Returns the deterministic value column for a record id.
pub fn test_value(id: u64) -> String {
    format!("Testval{id}")
}

/// Returns the rows expected for ids `0..count`, in order.
pub fn expected_rows(count: u64) -> Vec<Vec<String>> {
    (0..count)
        .map(|id| vec![id.to_string(), test_value(id)])
        .collect()
}
