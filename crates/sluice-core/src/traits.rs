//! Core traits for decompression.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Decompressor  (one-shot operations)
//!       ↓
//! StreamingDecompressor  (incremental, resumable)
//!       ↓
//! DictionaryDecompressor  (preset history)
//! ```

use crate::error::Result;
use crate::stats::InflateStats;
use crate::stream::{Flush, Progress};

/// One-shot decompression operations.
pub trait Decompressor {
    /// Decompress data in one shot.
    ///
    /// # Arguments
    /// * `input` - Compressed data
    ///
    /// # Returns
    /// Decompressed data as a vector.
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress data into existing buffer.
    ///
    /// # Arguments
    /// * `input` - Compressed data
    /// * `output` - Buffer to write decompressed data
    ///
    /// # Returns
    /// Number of bytes written to output.
    fn decompress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Decompress with known output size (more efficient).
    fn decompress_with_size(&self, input: &[u8], output_size: usize) -> Result<Vec<u8>> {
        let mut output = vec![0u8; output_size];
        let written = self.decompress_to(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }

    /// Get decompression statistics after operation.
    fn stats(&self) -> Option<InflateStats> {
        None
    }
}

/// Streaming decompression for incremental processing.
pub trait StreamingDecompressor {
    /// Begin a new decompression stream.
    fn begin(&mut self) -> Result<()>;

    /// Decompress a chunk of data.
    ///
    /// # Arguments
    /// * `input` - Compressed data chunk; unconsumed bytes must be supplied again
    /// * `output` - Buffer for decompressed output
    /// * `flush` - Flush mode
    ///
    /// # Returns
    /// The call status with bytes consumed and produced.
    fn decompress_chunk(&mut self, input: &[u8], output: &mut [u8], flush: Flush)
        -> Result<Progress>;

    /// Check if decompression is complete.
    fn is_finished(&self) -> bool;

    /// Reset decompressor state for reuse.
    fn reset(&mut self);
}

/// Decompression with a preset dictionary.
pub trait DictionaryDecompressor: StreamingDecompressor {
    /// Set decompression dictionary.
    /// Must match the dictionary used for compression.
    ///
    /// # Returns
    /// The Adler-32 of the dictionary.
    fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<u32>;
}
