//! Error types for decompression operations.

use thiserror::Error;

/// Result type alias for decompression operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Decompression error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data is corrupted or invalid.
    #[error("corrupted data: {message}")]
    CorruptedData {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Buffer too small for output.
    #[error("buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall { required: usize, provided: usize },

    /// Checksum verification failed.
    #[error("checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Unexpected end of input stream.
    #[error("unexpected EOF after {bytes_read} bytes")]
    UnexpectedEof { bytes_read: u64 },

    /// Stream state error.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration rejected before a stream was created.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::CorruptedData {
            message: message.into(),
            source: None,
        }
    }

    /// Create a corrupted data error with offset context.
    pub fn corrupted_at(message: impl Into<String>, offset: u64) -> Self {
        Error::CorruptedData {
            message: format!("{} at offset {}", message.into(), offset),
            source: None,
        }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(required: usize, provided: usize) -> Self {
        Error::BufferTooSmall { required, provided }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, actual: u32) -> Self {
        Error::ChecksumMismatch { expected, actual }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(bytes_read: u64) -> Self {
        Error::UnexpectedEof { bytes_read }
    }

    /// Create an invalid state error.
    pub fn invalid_state(expected: &'static str, actual: &'static str) -> Self {
        Error::InvalidState { expected, actual }
    }

    /// Diagnostic message carried by a [`Error::CorruptedData`], if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::CorruptedData { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Check if error is recoverable (can retry with more input or space).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedEof { .. } | Error::BufferTooSmall { .. }
        )
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::CorruptedData { .. } => "corrupted_data",
            Error::BufferTooSmall { .. } => "buffer_too_small",
            Error::ChecksumMismatch { .. } => "checksum_mismatch",
            Error::UnexpectedEof { .. } => "unexpected_eof",
            Error::InvalidState { .. } => "invalid_state",
            Error::InvalidConfig(_) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupted_message() {
        let err = Error::corrupted("invalid block type");
        assert_eq!(err.message(), Some("invalid block type"));
        assert_eq!(err.to_string(), "corrupted data: invalid block type");
        assert_eq!(err.category(), "corrupted_data");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_corrupted_at_offset() {
        let err = Error::corrupted_at("invalid distance code", 17);
        assert_eq!(err.message(), Some("invalid distance code at offset 17"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::unexpected_eof(10).is_recoverable());
        assert!(Error::buffer_too_small(10, 5).is_recoverable());
        assert!(!Error::checksum_mismatch(1, 2).is_recoverable());
        assert!(!Error::invalid_state("idle", "active").is_recoverable());
    }

    #[test]
    fn test_checksum_display() {
        let err = Error::checksum_mismatch(0x11E60398, 1);
        assert_eq!(
            err.to_string(),
            "checksum mismatch: expected 0x11e60398, got 0x00000001"
        );
    }
}
