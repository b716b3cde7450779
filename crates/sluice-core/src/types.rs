//! Core type definitions for decompression operations.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// History window size for the LZ77 back-reference buffer.
///
/// DEFLATE distances never exceed 32 KiB, so that is both the default and
/// the largest useful window. Streams encoded with a smaller window decode
/// with a matching smaller buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowSize {
    /// 256 byte window.
    W256,
    /// 512 byte window.
    W512,
    /// 1 KB window.
    W1K,
    /// 2 KB window.
    W2K,
    /// 4 KB window.
    W4K,
    /// 8 KB window.
    W8K,
    /// 16 KB window.
    W16K,
    /// 32 KB window (DEFLATE maximum).
    #[default]
    W32K,
}

impl WindowSize {
    /// Smallest accepted window, in bits.
    pub const MIN_BITS: u8 = 8;

    /// Largest accepted window, in bits.
    pub const MAX_BITS: u8 = 15;

    /// Base-2 logarithm of the window size (zlib's `windowBits`).
    pub fn bits(self) -> u8 {
        match self {
            WindowSize::W256 => 8,
            WindowSize::W512 => 9,
            WindowSize::W1K => 10,
            WindowSize::W2K => 11,
            WindowSize::W4K => 12,
            WindowSize::W8K => 13,
            WindowSize::W16K => 14,
            WindowSize::W32K => 15,
        }
    }

    /// Convert to bytes.
    pub fn to_bytes(self) -> usize {
        1usize << self.bits()
    }

    /// Create from a base-2 logarithm in `8..=15`.
    pub fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            8 => WindowSize::W256,
            9 => WindowSize::W512,
            10 => WindowSize::W1K,
            11 => WindowSize::W2K,
            12 => WindowSize::W4K,
            13 => WindowSize::W8K,
            14 => WindowSize::W16K,
            15 => WindowSize::W32K,
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "window bits {} outside {}..={}",
                    bits,
                    Self::MIN_BITS,
                    Self::MAX_BITS
                )))
            }
        })
    }

    /// Create from an exact power-of-two byte count.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        if !bytes.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "window size {} is not a power of two",
                bytes
            )));
        }
        let bits = bytes.trailing_zeros();
        if bits > u8::MAX as u32 {
            return Err(Error::InvalidConfig(format!("window size {} too large", bytes)));
        }
        Self::from_bits(bits as u8)
    }
}
