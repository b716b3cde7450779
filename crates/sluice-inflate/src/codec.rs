//! [`Decompressor`] implementation for raw DEFLATE.

use sluice_core::{Decompressor, Result, StreamConfig};

use crate::inflate::{inflate_to_with_config, inflate_with_config};
use crate::inflater::Inflater;

/// Raw DEFLATE decompressor.
#[derive(Debug, Clone, Default)]
pub struct DeflateDecompressor {
    config: StreamConfig,
}

impl DeflateDecompressor {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a stream configuration.
    pub fn with_config(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Start a streaming decoder with this decompressor's configuration.
    pub fn stream(&self) -> Inflater {
        Inflater::with_config(self.config.clone()).unwrap_or_default()
    }
}

impl Decompressor for DeflateDecompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        inflate_with_config(input, &mut output, &self.config)?;
        Ok(output)
    }

    fn decompress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        inflate_to_with_config(input, output, &self.config)
    }
}
