/// Represents one mapped row bound for the destination table.
///
/// [`MappedRow`] contains the column values for a single row, ordered to match the
/// destination table's column order. Values carry the textual form expected by the
/// store's bulk-load parser and are immutable once the row is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    /// Column values in destination column order.
    values: Vec<String>,
}

impl MappedRow {
    /// Creates a new mapped row with the given column values.
    ///
    /// The values should be ordered to match the destination table's column schema.
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Returns the column values in destination column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Consumes the row and returns its column values.
    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

impl From<Vec<String>> for MappedRow {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}
