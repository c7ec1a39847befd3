use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Maximum batch size cannot be zero.
    #[error("`batch.max_size` cannot be zero")]
    BatchMaxSizeZero,
    /// Pipe buffer capacity cannot be zero bytes.
    #[error("`pipe.buffer_bytes` cannot be zero")]
    PipeBufferBytesZero,
    /// Destination table name cannot be empty.
    #[error("`table` cannot be empty")]
    TableEmpty,
}
