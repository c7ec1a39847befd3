use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Buffering configuration for the in-process pipe that connects the batch
/// writer to the bulk-load command.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipeConfig {
    /// Capacity, in bytes, of the bounded pipe between the writer task and the
    /// bulk-load command. Writes block once the pipe is full, which bounds
    /// memory usage independently of batch size.
    #[serde(default = "default_pipe_buffer_bytes")]
    pub buffer_bytes: usize,
}

impl PipeConfig {
    /// Default pipe capacity in bytes.
    pub const DEFAULT_BUFFER_BYTES: usize = 524_288;

    /// Validates pipe configuration settings.
    ///
    /// Ensures buffer_bytes is non-zero, since a zero-capacity pipe could
    /// never transfer any data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.buffer_bytes == 0 {
            return Err(ValidationError::PipeBufferBytesZero);
        }

        Ok(())
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            buffer_bytes: default_pipe_buffer_bytes(),
        }
    }
}

fn default_pipe_buffer_bytes() -> usize {
    PipeConfig::DEFAULT_BUFFER_BYTES
}
