//! Statistics for decompression streams.

/// Counters collected while a stream is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InflateStats {
    /// Compressed bytes consumed.
    pub input_bytes: u64,

    /// Decompressed bytes emitted.
    pub output_bytes: u64,

    /// Stored (uncompressed) blocks seen.
    pub stored_blocks: u32,

    /// Fixed-Huffman blocks seen.
    pub fixed_blocks: u32,

    /// Dynamic-Huffman blocks seen.
    pub dynamic_blocks: u32,

    /// Times the fast decode loop was entered.
    pub fast_path_entries: u64,

    /// Adler-32 of the emitted bytes.
    pub checksum: u32,
}

impl InflateStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total blocks of any type.
    pub fn blocks(&self) -> u32 {
        self.stored_blocks + self.fixed_blocks + self.dynamic_blocks
    }

    /// Expansion ratio (output / input).
    pub fn expansion_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64
    }
}
