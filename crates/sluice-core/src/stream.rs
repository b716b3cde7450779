//! Streaming decompression vocabulary: flush modes, call status, stream
//! state and stream configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::WindowSize;

/// Flush modes for a streaming decompression call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    /// Decode as far as input and output allow.
    #[default]
    None,

    /// Return as soon as a block has been completed.
    /// Use for: indexing block boundaries, random-access checkpoints.
    Block,

    /// All remaining input is supplied in this call.
    /// Running out of input before the end of the stream is an error.
    Finish,
}

/// Outcome class of a single streaming call.
///
/// Malformed data is not a status: it is reported as an
/// [`Error::CorruptedData`](crate::Error::CorruptedData).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made and the requested stopping point was reached
    /// (a block boundary under [`Flush::Block`]).
    Ok,
    /// All supplied input was consumed; supply more to continue.
    NeedMoreInput,
    /// The output buffer is full; supply more space to continue.
    NeedMoreOutput,
    /// The final block was decoded and every byte has been emitted.
    StreamEnd,
    /// No progress was possible (nothing consumed, nothing produced).
    BufferError,
}

impl Status {
    /// Check if the stream has ended.
    pub fn is_end(self) -> bool {
        self == Status::StreamEnd
    }

    /// Check if the caller must supply something before progress is possible.
    pub fn is_suspended(self) -> bool {
        matches!(
            self,
            Status::NeedMoreInput | Status::NeedMoreOutput | Status::BufferError
        )
    }
}

/// Result of one streaming call: the status plus exact byte accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Why the call returned.
    pub status: Status,
    /// Bytes consumed from the front of the input slice.
    pub consumed: usize,
    /// Bytes written to the front of the output slice.
    pub produced: usize,
}

impl Progress {
    /// Create a new progress report.
    pub fn new(status: Status, consumed: usize, produced: usize) -> Self {
        Progress {
            status,
            consumed,
            produced,
        }
    }
}

/// Configuration for a decompression stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// History window size (default: 32 KB).
    pub window_size: WindowSize,

    /// Use the fast decode loop when enough slack is available
    /// (default: true).
    pub fast_path: bool,

    /// Output chunk size used by one-shot helpers (default: 64 KB).
    pub output_chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            window_size: WindowSize::default(),
            fast_path: true,
            output_chunk_size: 65536,
        }
    }
}

impl StreamConfig {
    /// Create a configuration with the given window size.
    pub fn with_window(window_size: WindowSize) -> Self {
        StreamConfig {
            window_size,
            ..Default::default()
        }
    }

    /// Check the configuration for values no stream can run with.
    pub fn validate(&self) -> Result<()> {
        if self.output_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "output_chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stream state for tracking progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Stream not started.
    #[default]
    Initial,
    /// Stream in progress.
    Active,
    /// Stream finished successfully.
    Finished,
    /// Stream encountered error.
    Error,
}

impl StreamState {
    /// Check if stream is in a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Finished | StreamState::Error)
    }

    /// Check if stream can accept more input.
    pub fn can_write(self) -> bool {
        matches!(self, StreamState::Initial | StreamState::Active)
    }

    /// Static name, used in state errors.
    pub fn name(self) -> &'static str {
        match self {
            StreamState::Initial => "initial",
            StreamState::Active => "active",
            StreamState::Finished => "finished",
            StreamState::Error => "error",
        }
    }
}
