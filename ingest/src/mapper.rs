use crate::error::IngestResult;
use crate::types::MappedRow;

/// Trait for mapping one input record to a row of the destination table.
///
/// A mapper is supplied by the caller and invoked once per record. The returned row must
/// contain one value per destination column, in column order. A mapping failure becomes a
/// processing failure for the unit of work containing the record.
pub trait RowMapper<T> {
    /// Maps `record` to its destination row.
    fn map_row(&self, record: T) -> IngestResult<MappedRow>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(T) -> IngestResult<MappedRow>,
{
    fn map_row(&self, record: T) -> IngestResult<MappedRow> {
        self(record)
    }
}
