//! Circular history buffer for LZ77 back-references.
//!
//! Every decoded byte is written into the window first and later flushed to
//! the caller's output, which is also where the checksum is updated. The
//! window therefore holds two overlapping ranges ending at the write cursor:
//!
//! - `pending`: written but not yet flushed (at most the capacity)
//! - `have`: valid history that back-references may reach
//!
//! A slot is only overwritten once it has been flushed, so
//! `free = capacity - pending`.

use sluice_core::WindowSize;

use crate::adler32::Adler32;
use crate::context::DecodeContext;

/// Sliding window over the decompressed stream.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    pub(crate) buf: Vec<u8>,
    pub(crate) write: usize,
    pub(crate) pending: usize,
    pub(crate) have: usize,
}

impl SlidingWindow {
    /// Allocate a window of the given size.
    pub fn new(size: WindowSize) -> Self {
        Self {
            buf: vec![0; size.to_bytes()],
            write: 0,
            pending: 0,
            have: 0,
        }
    }

    /// Window capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes that can be written before a flush is needed.
    #[inline]
    pub fn free(&self) -> usize {
        self.buf.len() - self.pending
    }

    /// Free bytes between the write cursor and the end of the buffer.
    #[inline]
    pub fn contiguous_free(&self) -> usize {
        self.free().min(self.buf.len() - self.write)
    }

    /// Bytes written but not yet flushed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Bytes of history available to back-references.
    #[inline]
    pub fn history(&self) -> usize {
        self.have
    }

    #[inline]
    fn mask(&self) -> usize {
        self.buf.len() - 1
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.write = (self.write + n) & self.mask();
        self.pending += n;
        self.have = (self.have + n).min(self.buf.len());
    }

    /// Append one byte. The caller checks [`free`](Self::free) first.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        debug_assert!(self.free() > 0);
        self.buf[self.write] = byte;
        self.advance(1);
    }

    /// Append as much of `data` as fits. Returns the count written.
    pub fn write_slice(&mut self, data: &[u8]) -> usize {
        let total = data.len().min(self.free());
        let mut done = 0;
        while done < total {
            let run = (total - done).min(self.buf.len() - self.write);
            self.buf[self.write..self.write + run].copy_from_slice(&data[done..done + run]);
            self.advance(run);
            done += run;
        }
        total
    }

    /// Copy up to `length` bytes from `distance` bytes behind the write
    /// cursor. Returns the count copied, bounded by the free space.
    ///
    /// The caller guarantees `1 <= distance <= history()`.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> usize {
        debug_assert!(distance >= 1 && distance <= self.have);
        let cap = self.buf.len();
        let mask = self.mask();
        let total = length.min(self.free());
        let mut left = total;

        while left > 0 {
            let dst = self.write;
            let src = (dst + cap - distance) & mask;
            let run = left.min(cap - dst).min(cap - src);

            if distance >= run {
                self.buf.copy_within(src..src + run, dst);
            } else {
                // Source overlaps the bytes being written: replicate.
                for i in 0..run {
                    self.buf[dst + i] = self.buf[src + i];
                }
            }

            self.advance(run);
            left -= run;
        }

        total
    }

    /// Move pending bytes to the output, oldest first, folding them into the
    /// checksum. Returns the count flushed.
    pub fn flush(&mut self, ctx: &mut DecodeContext<'_>, adler: &mut Adler32) -> usize {
        let cap = self.buf.len();
        let mut flushed = 0;

        while self.pending > 0 && ctx.output_remaining() > 0 {
            let start = (self.write + cap - self.pending) & self.mask();
            let run = self.pending.min(cap - start);
            let n = ctx.write_output(&self.buf[start..start + run]);
            adler.update(&self.buf[start..start + n]);
            self.pending -= n;
            flushed += n;
        }

        flushed
    }

    /// Install a preset dictionary as history. Only the last `capacity`
    /// bytes are kept; nothing becomes pending.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) {
        let cap = self.buf.len();
        let tail = &dictionary[dictionary.len().saturating_sub(cap)..];
        self.buf[..tail.len()].copy_from_slice(tail);
        self.write = tail.len() & self.mask();
        self.pending = 0;
        self.have = tail.len();
    }

    /// Forget all history. The allocation is kept.
    pub fn reset(&mut self) {
        self.write = 0;
        self.pending = 0;
        self.have = 0;
    }
}
