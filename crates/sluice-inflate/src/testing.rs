//! Bitstream construction helpers for tests.
//!
//! A minimal DEFLATE bit writer for hand-building streams that a general
//! purpose encoder would never emit: particular block layouts, malformed
//! headers and edge-case codes.
//!
//! Enable with `features = ["testing"]`.

use crate::huffman::{
    CL_CODE_ORDER, DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS, MAX_BITS,
};

/// Reverse the low `bits` bits of `code`.
pub fn reverse_bits(code: u32, bits: u8) -> u32 {
    let mut result = 0;
    let mut code = code;
    for _ in 0..bits {
        result = (result << 1) | (code & 1);
        code >>= 1;
    }
    result
}

/// Canonical codes `(code, length)` for each symbol, MSB-first as in
/// RFC 1951 section 3.2.2. Unused symbols get `(0, 0)`.
pub fn canonical_codes(lengths: &[u8]) -> Vec<(u32, u8)> {
    let mut bl_count = [0u32; MAX_BITS + 1];
    for &len in lengths {
        bl_count[len as usize] += 1;
    }
    bl_count[0] = 0;

    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0;
    for bits in 1..=MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                (0, 0)
            } else {
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                (code, len)
            }
        })
        .collect()
}

/// Fixed-Huffman literal/length code for `symbol`.
pub fn fixed_literal_code(symbol: usize) -> (u32, u8) {
    match symbol {
        0..=143 => (0x30 + symbol as u32, 8),
        144..=255 => (0x190 + (symbol - 144) as u32, 9),
        256..=279 => ((symbol - 256) as u32, 7),
        _ => (0xC0 + (symbol - 280) as u32, 8),
    }
}

/// Length symbol, extra-bit value and extra-bit count for a match length
/// in `3..=258`.
pub fn length_symbol(length: usize) -> (usize, u32, u8) {
    let index = LENGTH_BASE
        .iter()
        .rposition(|&base| base as usize <= length)
        .unwrap_or(0);
    (
        257 + index,
        (length - LENGTH_BASE[index] as usize) as u32,
        LENGTH_EXTRA_BITS[index],
    )
}

/// Distance symbol, extra-bit value and extra-bit count for a distance in
/// `1..=32768`.
pub fn distance_symbol(distance: usize) -> (usize, u32, u8) {
    let index = DISTANCE_BASE
        .iter()
        .rposition(|&base| base as usize <= distance)
        .unwrap_or(0);
    (
        index,
        (distance - DISTANCE_BASE[index] as usize) as u32,
        DISTANCE_EXTRA_BITS[index],
    )
}

/// LSB-first bit writer.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_buf: u64,
    bit_count: u8,
}

impl BitWriter {
    /// Create a new bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the low `n` bits of `value`.
    pub fn write_bits(&mut self, value: u32, n: u8) {
        self.bit_buf |= (value as u64) << self.bit_count;
        self.bit_count += n;

        while self.bit_count >= 8 {
            self.data.push(self.bit_buf as u8);
            self.bit_buf >>= 8;
            self.bit_count -= 8;
        }
    }

    /// Write a Huffman code (MSB-first code, so reversed on the wire).
    pub fn write_code(&mut self, code: u32, len: u8) {
        self.write_bits(reverse_bits(code, len), len);
    }

    /// Pad with zero bits to a byte boundary.
    pub fn align(&mut self) {
        if self.bit_count > 0 {
            self.data.push(self.bit_buf as u8);
            self.bit_buf = 0;
            self.bit_count = 0;
        }
    }

    /// Write raw bytes after aligning.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.align();
        self.data.extend_from_slice(bytes);
    }

    /// Block header: final flag and 2-bit type.
    pub fn block_header(&mut self, last: bool, block_type: u32) {
        self.write_bits(last as u32, 1);
        self.write_bits(block_type, 2);
    }

    /// A complete stored block.
    pub fn stored_block(&mut self, data: &[u8], last: bool) {
        assert!(data.len() <= 0xFFFF);
        self.block_header(last, 0);
        self.align();
        let len = data.len() as u16;
        self.write_bytes(&len.to_le_bytes());
        self.write_bytes(&(!len).to_le_bytes());
        self.write_bytes(data);
    }

    /// A fixed-Huffman literal.
    pub fn fixed_literal(&mut self, byte: u8) {
        let (code, len) = fixed_literal_code(byte as usize);
        self.write_code(code, len);
    }

    /// A fixed-Huffman length/distance pair.
    pub fn fixed_match(&mut self, length: usize, distance: usize) {
        let (symbol, extra, extra_bits) = length_symbol(length);
        let (code, len) = fixed_literal_code(symbol);
        self.write_code(code, len);
        self.write_bits(extra, extra_bits);

        let (symbol, extra, extra_bits) = distance_symbol(distance);
        self.write_code(symbol as u32, 5);
        self.write_bits(extra, extra_bits);
    }

    /// Fixed-Huffman end of block.
    pub fn fixed_end(&mut self) {
        self.write_code(0, 7);
    }

    /// Dynamic block header for the given code lengths.
    ///
    /// Code lengths are sent without run-length symbols, using a flat 4-bit
    /// code for length values 0-15. Returns the canonical codes for the
    /// literal/length and distance alphabets.
    pub fn dynamic_header(
        &mut self,
        last: bool,
        lit_lengths: &[u8],
        dist_lengths: &[u8],
    ) -> (Vec<(u32, u8)>, Vec<(u32, u8)>) {
        self.block_header(last, 2);
        self.write_bits((lit_lengths.len() - 257) as u32, 5);
        self.write_bits((dist_lengths.len() - 1) as u32, 5);
        self.write_bits(19 - 4, 4);

        for &symbol in CL_CODE_ORDER.iter() {
            let len = if symbol < 16 { 4 } else { 0 };
            self.write_bits(len, 3);
        }
        for &len in lit_lengths.iter().chain(dist_lengths) {
            self.write_code(len as u32, 4);
        }

        (canonical_codes(lit_lengths), canonical_codes(dist_lengths))
    }

    /// Write `symbol` with a code from [`canonical_codes`].
    pub fn symbol(&mut self, codes: &[(u32, u8)], symbol: usize) {
        let (code, len) = codes[symbol];
        self.write_code(code, len);
    }

    /// Bytes written so far, excluding a partial trailing byte.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.bit_count == 0
    }

    /// Flush remaining bits (pad with zeros).
    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.data
    }
}
