//! Literal/length and distance decoding with LZ77 copy.
//!
//! The general path is a resumable state machine: each state needs either
//! input bits or window space, and suspends without consuming anything
//! when it cannot finish its step. At every symbol boundary the decoder
//! checks whether the fast loop in [`crate::fast`] may run instead.

use sluice_core::{Error, InflateStats, Result};
use tracing::trace;

use crate::context::DecodeContext;
use crate::fast::{self, FastExit};
use crate::huffman::{fixed_tables, Code, HuffmanTable, Op};
use crate::window::SlidingWindow;

/// Minimum contiguous window space for the fast loop: one maximal match.
///
/// Larger than a 256 byte window, so [`WindowSize::W256`] streams always
/// take the general path.
///
/// [`WindowSize::W256`]: sluice_core::WindowSize::W256
pub(crate) const FAST_WINDOW_SLACK: usize = 258;

/// Minimum unread input for the fast loop: one refill plus headroom.
pub(crate) const FAST_INPUT_SLACK: usize = 10;

/// Tables used by the current block.
#[derive(Debug)]
pub enum TableSet {
    /// The shared fixed tables.
    Fixed,
    /// Tables built from a dynamic block header.
    Dynamic {
        /// Literal/length table.
        literal: HuffmanTable,
        /// Distance table.
        distance: HuffmanTable,
    },
}

impl TableSet {
    /// Literal/length table.
    #[inline]
    pub fn literal(&self) -> &HuffmanTable {
        match self {
            TableSet::Fixed => &fixed_tables().literal,
            TableSet::Dynamic { literal, .. } => literal,
        }
    }

    /// Distance table.
    #[inline]
    pub fn distance(&self) -> &HuffmanTable {
        match self {
            TableSet::Fixed => &fixed_tables().distance,
            TableSet::Dynamic { distance, .. } => distance,
        }
    }
}

/// Resume point inside a block's symbol stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeState {
    /// Decode the next literal/length symbol.
    #[default]
    LengthSymbol,
    /// Read the extra bits of a length code.
    LengthExtra { base: u16, extra: u8 },
    /// Decode the distance symbol of a match.
    DistanceSymbol { length: u16 },
    /// Read the extra bits of a distance code.
    DistanceExtra { length: u16, base: u16, extra: u8 },
    /// Copy the rest of a match into the window.
    CopyMatch { remaining: u16, distance: u16 },
    /// Store a decoded literal in the window.
    EmitLiteral(u8),
    /// End of block seen; give back over-read input.
    AfterEndOfBlock,
}

/// Why the code decoder returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStatus {
    /// The end-of-block code was consumed.
    EndOfBlock,
    /// More input is needed.
    NeedInput,
    /// The window is full; flush before continuing.
    WindowFull,
}

/// Resumable symbol decoder.
#[derive(Debug, Default)]
pub struct CodeDecoder {
    state: CodeState,
}

impl CodeDecoder {
    /// Create a decoder positioned at a symbol boundary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current resume point.
    pub fn state(&self) -> CodeState {
        self.state
    }

    /// Back to a symbol boundary.
    pub fn reset(&mut self) {
        self.state = CodeState::LengthSymbol;
    }

    /// Decode symbols until end of block, or until input or window space
    /// runs out.
    pub fn decode(
        &mut self,
        ctx: &mut DecodeContext<'_>,
        window: &mut SlidingWindow,
        tables: &TableSet,
        use_fast: bool,
        stats: &mut InflateStats,
    ) -> Result<CodeStatus> {
        loop {
            match self.state {
                CodeState::LengthSymbol => {
                    if use_fast
                        && window.contiguous_free() >= FAST_WINDOW_SLACK
                        && ctx.input_remaining() >= FAST_INPUT_SLACK
                    {
                        stats.fast_path_entries += 1;
                        let exit = fast::decode_fast(ctx, window, tables)?;
                        if exit == FastExit::EndOfBlock {
                            self.state = CodeState::AfterEndOfBlock;
                            continue;
                        }
                    }

                    let Some((code, bits)) = decode_symbol(ctx, tables.literal()) else {
                        return Ok(CodeStatus::NeedInput);
                    };
                    self.state = match code.op {
                        Op::Literal => CodeState::EmitLiteral(code.val as u8),
                        Op::Base { extra: 0 } => CodeState::DistanceSymbol { length: code.val },
                        Op::Base { extra } => CodeState::LengthExtra {
                            base: code.val,
                            extra,
                        },
                        Op::EndOfBlock => CodeState::AfterEndOfBlock,
                        Op::Invalid | Op::Link { .. } => {
                            return Err(Error::corrupted("invalid literal/length code"))
                        }
                    };
                    ctx.consume(bits);
                }

                CodeState::EmitLiteral(byte) => {
                    if window.free() == 0 {
                        return Ok(CodeStatus::WindowFull);
                    }
                    window.push(byte);
                    self.state = CodeState::LengthSymbol;
                }

                CodeState::LengthExtra { base, extra } => {
                    if !ctx.need(extra as u32) {
                        return Ok(CodeStatus::NeedInput);
                    }
                    let length = base + ctx.take(extra as u32) as u16;
                    self.state = CodeState::DistanceSymbol { length };
                }

                CodeState::DistanceSymbol { length } => {
                    let Some((code, bits)) = decode_symbol(ctx, tables.distance()) else {
                        return Ok(CodeStatus::NeedInput);
                    };
                    self.state = match code.op {
                        Op::Base { extra: 0 } => start_copy(window, length, code.val)?,
                        Op::Base { extra } => CodeState::DistanceExtra {
                            length,
                            base: code.val,
                            extra,
                        },
                        _ => return Err(Error::corrupted("invalid distance code")),
                    };
                    ctx.consume(bits);
                }

                CodeState::DistanceExtra {
                    length,
                    base,
                    extra,
                } => {
                    if !ctx.need(extra as u32) {
                        return Ok(CodeStatus::NeedInput);
                    }
                    let distance = base + ctx.peek(extra as u32) as u16;
                    self.state = start_copy(window, length, distance)?;
                    ctx.consume(extra as u32);
                }

                CodeState::CopyMatch {
                    remaining,
                    distance,
                } => {
                    if window.free() == 0 {
                        return Ok(CodeStatus::WindowFull);
                    }
                    let copied = window.copy_match(distance as usize, remaining as usize);
                    let remaining = remaining - copied as u16;
                    self.state = if remaining == 0 {
                        CodeState::LengthSymbol
                    } else {
                        CodeState::CopyMatch {
                            remaining,
                            distance,
                        }
                    };
                }

                CodeState::AfterEndOfBlock => {
                    let returned = ctx.return_whole_bytes();
                    if returned > 0 {
                        trace!(returned, "returned over-read input at end of block");
                    }
                    self.state = CodeState::LengthSymbol;
                    return Ok(CodeStatus::EndOfBlock);
                }
            }
        }
    }
}

/// Decode one symbol, pulling input a byte at a time until the code is
/// complete. Nothing is consumed; `None` means the input ran out.
#[inline]
fn decode_symbol(ctx: &mut DecodeContext<'_>, table: &HuffmanTable) -> Option<(Code, u32)> {
    loop {
        if let Some(found) = table.decode(ctx.hold(), ctx.available()) {
            return Some(found);
        }
        if !ctx.pull_byte() {
            return None;
        }
    }
}

/// Validate a match distance against the available history.
#[inline]
fn start_copy(window: &SlidingWindow, length: u16, distance: u16) -> Result<CodeState> {
    if distance as usize > window.history() {
        return Err(Error::corrupted("invalid distance too far back"));
    }
    Ok(CodeState::CopyMatch {
        remaining: length,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adler32::Adler32;
    use crate::context::BitBuffer;
    use crate::testing::BitWriter;
    use sluice_core::WindowSize;

    /// Fixed-code symbol stream (no block header) for a literal, a
    /// match and the end-of-block code.
    fn literal_then_match() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.fixed_literal(b'z');
        w.fixed_match(10, 1);
        w.fixed_end();
        w.finish()
    }

    fn run_to_end(input: &[u8], window: &mut SlidingWindow, use_fast: bool) -> Result<Vec<u8>> {
        let mut decoder = CodeDecoder::new();
        let mut bits = BitBuffer::new();
        let mut stats = InflateStats::new();
        let mut out = vec![0u8; 1024];
        let mut ctx = DecodeContext::new(input, &mut out, &mut bits);
        let status = decoder.decode(&mut ctx, window, &TableSet::Fixed, use_fast, &mut stats)?;
        assert_eq!(status, CodeStatus::EndOfBlock);
        let n = window.flush(&mut ctx, &mut Adler32::new());
        out.truncate(n);
        Ok(out)
    }

    #[test]
    fn test_literal_and_overlapping_match() {
        let mut window = SlidingWindow::new(WindowSize::W32K);
        let out = run_to_end(&literal_then_match(), &mut window, false).unwrap();
        assert_eq!(out, vec![b'z'; 11]);
    }

    #[test]
    fn test_resumes_one_byte_at_a_time() {
        let input = literal_then_match();
        let mut decoder = CodeDecoder::new();
        let mut window = SlidingWindow::new(WindowSize::W32K);
        let mut bits = BitBuffer::new();
        let mut stats = InflateStats::new();
        let mut out = [0u8; 0];

        let mut ended = false;
        for byte in input.chunks(1) {
            let mut ctx = DecodeContext::new(byte, &mut out, &mut bits);
            let status = decoder
                .decode(&mut ctx, &mut window, &TableSet::Fixed, true, &mut stats)
                .unwrap();
            if status == CodeStatus::EndOfBlock {
                ended = true;
                break;
            }
            assert_eq!(status, CodeStatus::NeedInput);
        }
        assert!(ended);
        assert_eq!(window.pending(), 11);
        assert_eq!(stats.fast_path_entries, 0);
    }

    #[test]
    fn test_distance_too_far_back() {
        let mut w = BitWriter::new();
        w.fixed_literal(b'a');
        w.fixed_match(3, 2);
        w.fixed_end();
        let mut window = SlidingWindow::new(WindowSize::W32K);
        let err = run_to_end(&w.finish(), &mut window, false).unwrap_err();
        assert!(err.to_string().contains("invalid distance too far back"));
    }

    #[test]
    fn test_invalid_literal_code() {
        // Fixed symbol 286 (11000110) is never valid.
        let mut w = BitWriter::new();
        w.write_code(0b1100_0110, 8);
        let mut window = SlidingWindow::new(WindowSize::W32K);
        let err = run_to_end(&w.finish(), &mut window, false).unwrap_err();
        assert!(err.to_string().contains("invalid literal/length code"));
    }

    #[test]
    fn test_invalid_distance_code() {
        let mut w = BitWriter::new();
        w.fixed_literal(b'a');
        let (code, len) = crate::testing::fixed_literal_code(257);
        w.write_code(code, len);
        w.write_code(31, 5);
        let mut window = SlidingWindow::new(WindowSize::W32K);
        let err = run_to_end(&w.finish(), &mut window, false).unwrap_err();
        assert!(err.to_string().contains("invalid distance code"));
    }

    #[test]
    fn test_window_full_suspends_mid_match() {
        let mut window = SlidingWindow::new(WindowSize::W256);
        let mut w = BitWriter::new();
        w.fixed_literal(b'q');
        w.fixed_match(258, 1);
        w.fixed_match(100, 1);
        w.fixed_end();
        let input = w.finish();

        let mut decoder = CodeDecoder::new();
        let mut bits = BitBuffer::new();
        let mut stats = InflateStats::new();
        let mut adler = Adler32::new();
        let mut collected = Vec::new();
        let mut in_pos = 0;

        loop {
            let mut out = [0u8; 64];
            let mut ctx = DecodeContext::new(&input[in_pos..], &mut out, &mut bits);
            let status = decoder
                .decode(&mut ctx, &mut window, &TableSet::Fixed, true, &mut stats)
                .unwrap();
            window.flush(&mut ctx, &mut adler);
            let (consumed, produced) = (ctx.consumed(), ctx.produced());
            in_pos += consumed;
            collected.extend_from_slice(&out[..produced]);
            match status {
                CodeStatus::WindowFull => continue,
                CodeStatus::EndOfBlock => break,
                CodeStatus::NeedInput => panic!("input was complete"),
            }
        }

        let mut out = [0u8; 256];
        let mut ctx = DecodeContext::new(&[], &mut out, &mut bits);
        let n = window.flush(&mut ctx, &mut adler);
        collected.extend_from_slice(&out[..n]);
        assert_eq!(collected, vec![b'q'; 359]);
    }
}
