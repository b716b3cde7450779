//! Huffman decode tables for DEFLATE.
//!
//! Builds canonical-Huffman lookup tables from per-symbol code lengths, as
//! specified in RFC 1951 section 3.2.2. A table is a flat array of [`Code`]
//! entries: a root level indexed by the low `root_bits` of the (bit-reversed)
//! input, plus second-level sub-tables for codes longer than the root.
//! A root entry whose op is [`Op::Link`] points at its sub-table.
//!
//! Three alphabets use the same builder:
//!
//! - code lengths (19 symbols, transient while reading a dynamic header)
//! - literal/length (up to 288 symbols)
//! - distance (up to 32 symbols)
//!
//! The fixed tables of section 3.2.6 are built once per process and shared.

use std::sync::OnceLock;

use sluice_core::{Error, Result};
use tracing::trace;

/// Maximum bits in a Huffman code.
pub const MAX_BITS: usize = 15;

/// Maximum number of literal/length codes.
pub const MAX_LIT_CODES: usize = 286;

/// Maximum number of distance codes.
pub const MAX_DIST_CODES: usize = 30;

/// Maximum number of code length codes.
pub const MAX_CL_CODES: usize = 19;

/// End-of-block symbol in the literal/length alphabet.
pub const END_OF_BLOCK: usize = 256;

/// Root index bits for literal/length tables.
pub const LIT_ROOT_BITS: u8 = 9;

/// Root index bits for distance tables.
pub const DIST_ROOT_BITS: u8 = 6;

/// Root index bits for the code length table.
pub const CL_ROOT_BITS: u8 = 7;

/// Fixed Huffman literal/length code lengths (RFC 1951 section 3.2.6).
pub const FIXED_LIT_LENGTHS: [u8; 288] = {
    let mut lengths = [0u8; 288];
    let mut i = 0;
    while i < 144 {
        lengths[i] = 8;
        i += 1;
    }
    while i < 256 {
        lengths[i] = 9;
        i += 1;
    }
    while i < 280 {
        lengths[i] = 7;
        i += 1;
    }
    while i < 288 {
        lengths[i] = 8;
        i += 1;
    }
    lengths
};

/// Fixed Huffman distance code lengths.
pub const FIXED_DIST_LENGTHS: [u8; 32] = [5; 32];

/// Order of code length codes in the dynamic header.
pub const CL_CODE_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base lengths for length codes 257-285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Base distances for distance codes 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// What a decode table entry means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Terminal symbol; `val` is the literal byte (or code length symbol).
    Literal,
    /// Length or distance base in `val`, followed by `extra` raw bits.
    Base { extra: u8 },
    /// End of the current block.
    EndOfBlock,
    /// Sub-table at offset `val`, indexed by the next `bits` input bits.
    Link { bits: u8 },
    /// No code maps here.
    Invalid,
}

/// One decode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    /// Operation.
    pub op: Op,
    /// Input bits consumed at this table level.
    pub bits: u8,
    /// Literal, base value, or sub-table offset.
    pub val: u16,
}

impl Code {
    const INVALID: Code = Code {
        op: Op::Invalid,
        bits: 1,
        val: 0,
    };
}

/// Which alphabet a table decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// The 19-symbol code length alphabet of a dynamic header.
    CodeLengths,
    /// Literal/length alphabet.
    LiteralLength,
    /// Distance alphabet.
    Distance,
}

impl CodeKind {
    fn root_bits(self) -> u8 {
        match self {
            CodeKind::CodeLengths => CL_ROOT_BITS,
            CodeKind::LiteralLength => LIT_ROOT_BITS,
            CodeKind::Distance => DIST_ROOT_BITS,
        }
    }

    fn entry(self, symbol: u16) -> (Op, u16) {
        let s = symbol as usize;
        match self {
            CodeKind::CodeLengths => (Op::Literal, symbol),
            CodeKind::LiteralLength => match s {
                0..=255 => (Op::Literal, symbol),
                END_OF_BLOCK => (Op::EndOfBlock, 0),
                257..=285 => (
                    Op::Base {
                        extra: LENGTH_EXTRA_BITS[s - 257],
                    },
                    LENGTH_BASE[s - 257],
                ),
                _ => (Op::Invalid, 0),
            },
            CodeKind::Distance => match s {
                0..=29 => (
                    Op::Base {
                        extra: DISTANCE_EXTRA_BITS[s],
                    },
                    DISTANCE_BASE[s],
                ),
                _ => (Op::Invalid, 0),
            },
        }
    }

    fn oversubscribed(self) -> &'static str {
        match self {
            CodeKind::CodeLengths => "oversubscribed dynamic bit lengths tree",
            CodeKind::LiteralLength => "oversubscribed literal/length tree",
            CodeKind::Distance => "oversubscribed distance tree",
        }
    }

    fn incomplete(self) -> &'static str {
        match self {
            CodeKind::CodeLengths => "incomplete dynamic bit lengths tree",
            CodeKind::LiteralLength => "incomplete literal/length tree",
            CodeKind::Distance => "incomplete distance tree",
        }
    }
}

/// Two-level Huffman decode table.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    codes: Vec<Code>,
    root_bits: u8,
}

impl HuffmanTable {
    /// Build a decode table from code lengths.
    ///
    /// Oversubscribed length sets are always rejected. Incomplete sets are
    /// rejected unless they consist of a single code of length 1 in the
    /// literal/length or distance alphabet. An all-zero set builds a table
    /// in which every lookup is [`Op::Invalid`].
    pub fn build(kind: CodeKind, lengths: &[u8]) -> Result<Self> {
        let mut count = [0u16; MAX_BITS + 1];
        for &len in lengths {
            if len as usize > MAX_BITS {
                return Err(Error::corrupted(format!(
                    "code length {} exceeds {}",
                    len, MAX_BITS
                )));
            }
            count[len as usize] += 1;
        }
        count[0] = 0;

        let mut max = MAX_BITS;
        while max >= 1 && count[max] == 0 {
            max -= 1;
        }
        if max == 0 {
            return Ok(Self {
                codes: vec![Code::INVALID; 2],
                root_bits: 1,
            });
        }
        let mut min = 1;
        while min < max && count[min] == 0 {
            min += 1;
        }
        let root = (kind.root_bits() as usize).clamp(min, max);

        // Kraft inequality, counted in units of the longest code.
        let mut left: i32 = 1;
        for &n in &count[1..] {
            left <<= 1;
            left -= n as i32;
            if left < 0 {
                return Err(Error::corrupted(kind.oversubscribed()));
            }
        }
        if left > 0 && (kind == CodeKind::CodeLengths || max != 1) {
            return Err(Error::corrupted(kind.incomplete()));
        }

        // Symbols sorted by code length, then by symbol value.
        let mut offs = [0u16; MAX_BITS + 1];
        for len in 1..MAX_BITS {
            offs[len + 1] = offs[len] + count[len];
        }
        let coded = offs[MAX_BITS] as usize + count[MAX_BITS] as usize;
        let mut work = vec![0u16; coded];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                work[offs[len as usize] as usize] = symbol as u16;
                offs[len as usize] += 1;
            }
        }

        let mut codes = vec![Code::INVALID; 1 << root];
        let mask = (1usize << root) - 1;
        let mut huff = 0usize;
        let mut sym = 0usize;
        let mut len = min;
        let mut next = 0usize;
        let mut curr = root;
        let mut drop = 0usize;
        let mut low = usize::MAX;

        loop {
            let (op, val) = kind.entry(work[sym]);
            let here = Code {
                op,
                bits: (len - drop) as u8,
                val,
            };

            // Replicate over every index whose low bits match the code.
            let step = 1usize << (len - drop);
            let mut fill = 1usize << curr;
            loop {
                fill -= step;
                codes[next + (huff >> drop) + fill] = here;
                if fill == 0 {
                    break;
                }
            }

            // Advance `huff` to the next code, incrementing in reversed order.
            let mut incr = 1usize << (len - 1);
            while huff & incr != 0 {
                incr >>= 1;
            }
            if incr != 0 {
                huff &= incr - 1;
                huff += incr;
            } else {
                huff = 0;
            }

            sym += 1;
            count[len] -= 1;
            if count[len] == 0 {
                if len == max {
                    break;
                }
                len = lengths[work[sym] as usize] as usize;
            }

            // Longer than the root: start a new sub-table when the root
            // prefix changes.
            if len > root && (huff & mask) != low {
                if drop == 0 {
                    drop = root;
                }
                curr = len - drop;
                let mut room: i32 = 1 << curr;
                while curr + drop < max {
                    room -= count[curr + drop] as i32;
                    if room <= 0 {
                        break;
                    }
                    curr += 1;
                    room <<= 1;
                }

                next = codes.len();
                codes.resize(next + (1 << curr), Code::INVALID);
                low = huff & mask;
                codes[low] = Code {
                    op: Op::Link { bits: curr as u8 },
                    bits: root as u8,
                    val: next as u16,
                };
            }
        }

        trace!(
            ?kind,
            symbols = coded,
            root_bits = root,
            entries = codes.len(),
            "built huffman table"
        );

        Ok(Self {
            codes,
            root_bits: root as u8,
        })
    }

    /// Root index bits.
    #[inline]
    pub fn root_bits(&self) -> u8 {
        self.root_bits
    }

    /// Total entries across the root table and all sub-tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the table has no entries (never true for a built table).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Look up the code at the bottom of `hold`.
    ///
    /// `available` is the number of valid bits in `hold`; bits above it must
    /// be zero. Returns the terminal entry and the total number of bits the
    /// code occupies, or `None` if more bits are needed to tell.
    #[inline]
    pub fn decode(&self, hold: u64, available: u32) -> Option<(Code, u32)> {
        let (code, bits) = self.lookup(hold);
        (bits <= available).then_some((code, bits))
    }

    /// Look up the code at the bottom of `hold`, assuming at least 15 valid
    /// bits. Returns the terminal entry and the total bits it occupies.
    #[inline]
    pub fn lookup(&self, hold: u64) -> (Code, u32) {
        let root_mask = (1u64 << self.root_bits) - 1;
        let here = self.codes[(hold & root_mask) as usize];
        match here.op {
            Op::Link { bits } => {
                let sub_mask = (1u64 << bits) - 1;
                let index = here.val as usize + ((hold >> here.bits) & sub_mask) as usize;
                let sub = self.codes[index];
                (sub, here.bits as u32 + sub.bits as u32)
            }
            _ => (here, here.bits as u32),
        }
    }
}

/// The fixed literal/length and distance tables.
#[derive(Debug)]
pub struct FixedTables {
    /// Literal/length table.
    pub literal: HuffmanTable,
    /// Distance table.
    pub distance: HuffmanTable,
}

static FIXED_TABLES: OnceLock<FixedTables> = OnceLock::new();

/// Get the shared fixed tables, building them on first access.
#[inline]
pub fn fixed_tables() -> &'static FixedTables {
    FIXED_TABLES.get_or_init(|| FixedTables {
        literal: HuffmanTable::build(CodeKind::LiteralLength, &FIXED_LIT_LENGTHS)
            .expect("fixed literal/length code is complete"),
        distance: HuffmanTable::build(CodeKind::Distance, &FIXED_DIST_LENGTHS)
            .expect("fixed distance code is complete"),
    })
}

/// Build the code length table of a dynamic header.
pub fn build_bit_length_table(lengths: &[u8; MAX_CL_CODES]) -> Result<HuffmanTable> {
    HuffmanTable::build(CodeKind::CodeLengths, lengths)
}

/// Build the literal/length and distance tables of a dynamic block from the
/// concatenated `nlen + ndist` code lengths.
pub fn build_dynamic_tables(lengths: &[u8], nlen: usize) -> Result<(HuffmanTable, HuffmanTable)> {
    let (lit, dist) = lengths.split_at(nlen);
    let literal = HuffmanTable::build(CodeKind::LiteralLength, lit)?;
    let distance = HuffmanTable::build(CodeKind::Distance, dist)?;
    Ok((literal, distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{canonical_codes, reverse_bits};

    fn decode_code(table: &HuffmanTable, code: u32, len: u8) -> (Code, u32) {
        let hold = reverse_bits(code, len) as u64;
        table.decode(hold, len as u32).expect("code fully available")
    }

    #[test]
    fn test_fixed_literal_codes() {
        let fixed = fixed_tables();
        assert_eq!(fixed.literal.root_bits(), 9);

        // 'A' = 0x30 + 65, 8 bits.
        let (code, bits) = decode_code(&fixed.literal, 0x30 + 65, 8);
        assert_eq!(code.op, Op::Literal);
        assert_eq!(code.val, 65);
        assert_eq!(bits, 8);

        // End of block: seven zero bits.
        let (code, bits) = decode_code(&fixed.literal, 0, 7);
        assert_eq!(code.op, Op::EndOfBlock);
        assert_eq!(bits, 7);

        // Symbol 285: 11000101, length 258 with no extra bits.
        let (code, _) = decode_code(&fixed.literal, 0b1100_0101, 8);
        assert_eq!(code.op, Op::Base { extra: 0 });
        assert_eq!(code.val, 258);

        // Symbol 255: 9 bits, 111111111.
        let (code, bits) = decode_code(&fixed.literal, 0x1FF, 9);
        assert_eq!(code.op, Op::Literal);
        assert_eq!(code.val, 255);
        assert_eq!(bits, 9);
    }

    #[test]
    fn test_fixed_invalid_symbols() {
        let fixed = fixed_tables();
        // Symbols 286 and 287 are 11000110 and 11000111.
        let (code, _) = decode_code(&fixed.literal, 0b1100_0110, 8);
        assert_eq!(code.op, Op::Invalid);
        // Distances 30 and 31.
        let (code, _) = decode_code(&fixed.distance, 30, 5);
        assert_eq!(code.op, Op::Invalid);
        let (code, _) = decode_code(&fixed.distance, 29, 5);
        assert_eq!(code.op, Op::Base { extra: 13 });
        assert_eq!(code.val, 24577);
    }

    #[test]
    fn test_oversubscribed_rejected() {
        let err = HuffmanTable::build(CodeKind::CodeLengths, &[1, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("oversubscribed dynamic bit lengths tree"));

        let err = HuffmanTable::build(CodeKind::LiteralLength, &[1, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("oversubscribed literal/length tree"));
    }

    #[test]
    fn test_incomplete_rejected() {
        let err = HuffmanTable::build(CodeKind::Distance, &[1, 2]).unwrap_err();
        assert!(err.to_string().contains("incomplete distance tree"));

        // A lone code length code is never enough.
        let err = HuffmanTable::build(CodeKind::CodeLengths, &[0, 1]).unwrap_err();
        assert!(err.to_string().contains("incomplete dynamic bit lengths tree"));
    }

    #[test]
    fn test_single_code_distance() {
        let table = HuffmanTable::build(CodeKind::Distance, &[1]).unwrap();
        let (code, bits) = table.decode(0, 1).unwrap();
        assert_eq!(code.op, Op::Base { extra: 0 });
        assert_eq!(code.val, 1);
        assert_eq!(bits, 1);

        let (code, _) = table.decode(1, 1).unwrap();
        assert_eq!(code.op, Op::Invalid);
    }

    #[test]
    fn test_all_zero_lengths_decode_invalid() {
        let table = HuffmanTable::build(CodeKind::Distance, &[0; 30]).unwrap();
        for hold in 0..4u64 {
            let (code, _) = table.decode(hold, 8).unwrap();
            assert_eq!(code.op, Op::Invalid);
        }
    }

    #[test]
    fn test_canonical_order_within_length() {
        // Lengths from RFC 1951 section 3.2.2: A..H = 3,3,3,3,3,2,4,4.
        let lengths = [3, 3, 3, 3, 3, 2, 4, 4];
        let table = HuffmanTable::build(CodeKind::CodeLengths, &lengths).unwrap();
        let expected = [
            (0b010, 3),
            (0b011, 3),
            (0b100, 3),
            (0b101, 3),
            (0b110, 3),
            (0b00, 2),
            (0b1110, 4),
            (0b1111, 4),
        ];
        for (symbol, &(code, len)) in expected.iter().enumerate() {
            let (entry, bits) = decode_code(&table, code, len);
            assert_eq!(entry.val as usize, symbol);
            assert_eq!(bits, len as u32);
        }
    }

    #[test]
    fn test_fifteen_bit_codes_use_sub_tables() {
        // Lengths 1, 2, ..., 14, 15, 15: complete, and deeper than any root.
        let mut lengths: Vec<u8> = (1..=15).collect();
        lengths.push(15);
        let table = HuffmanTable::build(CodeKind::LiteralLength, &lengths).unwrap();
        assert_eq!(table.root_bits(), LIT_ROOT_BITS);
        assert!(table.len() > 1 << LIT_ROOT_BITS);

        for (symbol, (code, len)) in canonical_codes(&lengths).into_iter().enumerate() {
            let (entry, bits) = decode_code(&table, code, len);
            assert_eq!(entry.op, Op::Literal, "symbol {}", symbol);
            assert_eq!(entry.val as usize, symbol);
            assert_eq!(bits, len as u32);
        }
    }

    #[test]
    fn test_partial_bits_need_more() {
        let fixed = fixed_tables();
        // Nine-bit literal with only eight bits available.
        let hold = reverse_bits(0x1FF, 9) as u64 & 0xFF;
        assert!(fixed.literal.decode(hold, 8).is_none());
    }

    #[test]
    fn test_dynamic_split() {
        let mut lengths = vec![0u8; 257 + 1];
        lengths[65] = 1;
        lengths[END_OF_BLOCK] = 1;
        lengths[257] = 1;
        let (lit, dist) = build_dynamic_tables(&lengths, 257).unwrap();
        assert_eq!(lit.decode(0, 1).unwrap().0.val, 65);
        assert_eq!(lit.decode(1, 1).unwrap().0.op, Op::EndOfBlock);
        assert_eq!(dist.decode(0, 1).unwrap().0.op, Op::Base { extra: 0 });
    }
}
