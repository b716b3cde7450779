//! Fast decode loop.
//!
//! Runs only while there is room for a whole symbol on both sides: at least
//! [`FAST_INPUT_SLACK`] unread input bytes and [`FAST_WINDOW_SLACK`]
//! contiguous window bytes. Under those bounds one refill of the 64-bit
//! accumulator covers a full length/distance pair (at most 48 bits), so the
//! loop decodes without any per-step input or space checks and writes
//! straight into the window buffer.

use sluice_core::{Error, Result};
use tracing::trace;

use crate::codes::{TableSet, FAST_INPUT_SLACK, FAST_WINDOW_SLACK};
use crate::context::DecodeContext;
use crate::huffman::Op;
use crate::window::SlidingWindow;

/// Why the fast loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FastExit {
    /// Input or window slack dropped below the threshold.
    Slack,
    /// The end-of-block code was consumed.
    EndOfBlock,
}

/// Decode symbols at a symbol boundary until slack runs out or the block
/// ends. Whole bytes pulled but not used are returned to the input.
pub(crate) fn decode_fast(
    ctx: &mut DecodeContext<'_>,
    window: &mut SlidingWindow,
    tables: &TableSet,
) -> Result<FastExit> {
    let lit = tables.literal();
    let dist = tables.distance();

    let input = ctx.input;
    let mut pos = ctx.in_pos;
    let mut hold = ctx.bits.hold;
    let mut count = ctx.bits.count;

    let cap = window.buf.len();
    let mask = cap - 1;
    let start = window.write;
    let mut write = window.write;
    let mut have = window.have;
    let pending_before = window.pending;
    let buf = &mut window.buf[..];

    let mut symbols = 0u64;
    let result = loop {
        let free = cap - pending_before - (write - start);
        if input.len() - pos < FAST_INPUT_SLACK
            || free.min(cap - write) < FAST_WINDOW_SLACK
        {
            break Ok(FastExit::Slack);
        }

        while count <= 56 {
            hold |= (input[pos] as u64) << count;
            pos += 1;
            count += 8;
        }

        let (here, bits) = lit.lookup(hold);
        hold >>= bits;
        count -= bits;
        symbols += 1;

        match here.op {
            Op::Literal => {
                buf[write] = here.val as u8;
                write += 1;
                have = (have + 1).min(cap);
            }
            Op::Base { extra } => {
                let length = here.val as usize + (hold & ((1u64 << extra) - 1)) as usize;
                hold >>= extra;
                count -= extra as u32;

                let (here, bits) = dist.lookup(hold);
                hold >>= bits;
                count -= bits;
                let distance = match here.op {
                    Op::Base { extra } => {
                        let d = here.val as usize + (hold & ((1u64 << extra) - 1)) as usize;
                        hold >>= extra;
                        count -= extra as u32;
                        d
                    }
                    _ => break Err(Error::corrupted("invalid distance code")),
                };
                if distance > have {
                    break Err(Error::corrupted("invalid distance too far back"));
                }

                let src = (write + cap - distance) & mask;
                if distance >= length && src + length <= cap {
                    buf.copy_within(src..src + length, write);
                } else {
                    for i in 0..length {
                        buf[write + i] = buf[(src + i) & mask];
                    }
                }
                write += length;
                have = (have + length).min(cap);
            }
            Op::EndOfBlock => break Ok(FastExit::EndOfBlock),
            Op::Invalid | Op::Link { .. } => {
                break Err(Error::corrupted("invalid literal/length code"))
            }
        }
    };

    window.pending = pending_before + (write - start);
    window.write = write & mask;
    window.have = have;
    ctx.in_pos = pos;
    ctx.bits.hold = hold;
    ctx.bits.count = count;
    let returned = ctx.return_whole_bytes();

    trace!(symbols, returned, exit = ?result.as_ref().ok(), "fast loop exit");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adler32::Adler32;
    use crate::context::BitBuffer;
    use crate::testing::BitWriter;
    use sluice_core::WindowSize;

    fn flush_all(window: &mut SlidingWindow) -> Vec<u8> {
        let mut out = vec![0u8; window.capacity()];
        let mut bits = BitBuffer::new();
        let mut ctx = DecodeContext::new(&[], &mut out, &mut bits);
        let n = window.flush(&mut ctx, &mut Adler32::new());
        out.truncate(n);
        out
    }

    #[test]
    fn test_fast_block_to_end() {
        let mut w = BitWriter::new();
        for &b in b"fast path " {
            w.fixed_literal(b);
        }
        w.fixed_match(20, 10);
        w.fixed_end();
        // Padding so the loop has slack all the way to the end code.
        w.write_bytes(&[0; 16]);
        let input = w.finish();

        let mut window = SlidingWindow::new(WindowSize::W32K);
        let mut bits = BitBuffer::new();
        let mut out = [0u8; 0];
        let mut ctx = DecodeContext::new(&input, &mut out, &mut bits);
        let exit = decode_fast(&mut ctx, &mut window, &TableSet::Fixed).unwrap();
        assert_eq!(exit, FastExit::EndOfBlock);

        // Bytes read ahead were handed back: the cursor sits inside the
        // byte holding the end-of-block code.
        assert!(ctx.available() < 8);
        assert_eq!(ctx.consumed(), input.len() - 16);
        assert_eq!(flush_all(&mut window), b"fast path fast path fast path ");
    }

    #[test]
    fn test_fast_stops_on_short_input() {
        let mut w = BitWriter::new();
        for _ in 0..40 {
            w.fixed_literal(b'k');
        }
        let input = w.finish();

        let mut window = SlidingWindow::new(WindowSize::W32K);
        let mut bits = BitBuffer::new();
        let mut out = [0u8; 0];
        let mut ctx = DecodeContext::new(&input, &mut out, &mut bits);
        let exit = decode_fast(&mut ctx, &mut window, &TableSet::Fixed).unwrap();
        assert_eq!(exit, FastExit::Slack);
        assert!(ctx.input_remaining() >= FAST_INPUT_SLACK - 1);

        let decoded = window.pending();
        assert!(decoded > 0 && decoded < 40);
        assert!(flush_all(&mut window).iter().all(|&b| b == b'k'));
    }

    #[test]
    fn test_fast_rejects_far_distance() {
        let mut w = BitWriter::new();
        w.fixed_literal(b'x');
        w.fixed_match(5, 4);
        w.write_bytes(&[0; 16]);
        let input = w.finish();

        let mut window = SlidingWindow::new(WindowSize::W32K);
        let mut bits = BitBuffer::new();
        let mut out = [0u8; 0];
        let mut ctx = DecodeContext::new(&input, &mut out, &mut bits);
        let err = decode_fast(&mut ctx, &mut window, &TableSet::Fixed).unwrap_err();
        assert!(err.to_string().contains("too far back"));
    }
}
