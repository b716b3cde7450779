//! Per-call decode context: input cursor, output cursor and the bit
//! accumulator.
//!
//! DEFLATE packs data LSB-first, so new bytes are shifted in above the bits
//! already held and codes are read from the bottom. The accumulator
//! ([`BitBuffer`]) lives in the stream and survives between calls; the
//! cursors borrow the caller's slices for the duration of one call.

/// Bits carried from one call to the next.
///
/// Bits above `count` are always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitBuffer {
    pub(crate) hold: u64,
    pub(crate) count: u32,
}

impl BitBuffer {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self { hold: 0, count: 0 }
    }

    /// Number of buffered bits.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Discard all buffered bits.
    pub fn clear(&mut self) {
        self.hold = 0;
        self.count = 0;
    }
}

/// Cursors over the caller's buffers plus the stream's bit accumulator.
pub struct DecodeContext<'a> {
    pub(crate) input: &'a [u8],
    pub(crate) in_pos: usize,
    pub(crate) output: &'a mut [u8],
    pub(crate) out_pos: usize,
    pub(crate) bits: &'a mut BitBuffer,
}

impl<'a> DecodeContext<'a> {
    /// Wrap one call's buffers.
    pub fn new(input: &'a [u8], output: &'a mut [u8], bits: &'a mut BitBuffer) -> Self {
        Self {
            input,
            in_pos: 0,
            output,
            out_pos: 0,
            bits,
        }
    }

    /// Input bytes consumed so far in this call.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.in_pos
    }

    /// Output bytes written so far in this call.
    #[inline]
    pub fn produced(&self) -> usize {
        self.out_pos
    }

    /// Unread input bytes.
    #[inline]
    pub fn input_remaining(&self) -> usize {
        self.input.len() - self.in_pos
    }

    /// Free output space.
    #[inline]
    pub fn output_remaining(&self) -> usize {
        self.output.len() - self.out_pos
    }

    /// Buffered bits.
    #[inline]
    pub fn available(&self) -> u32 {
        self.bits.count
    }

    /// Raw accumulator contents.
    #[inline]
    pub fn hold(&self) -> u64 {
        self.bits.hold
    }

    /// Move one input byte into the accumulator. Returns `false` when the
    /// input is exhausted.
    #[inline]
    pub fn pull_byte(&mut self) -> bool {
        match self.input.get(self.in_pos) {
            Some(&byte) => {
                self.bits.hold |= (byte as u64) << self.bits.count;
                self.bits.count += 8;
                self.in_pos += 1;
                true
            }
            None => false,
        }
    }

    /// Make sure at least `n` bits are buffered. Returns `false`, with every
    /// pulled byte kept in the accumulator, if the input runs out first.
    #[inline]
    pub fn need(&mut self, n: u32) -> bool {
        while self.bits.count < n {
            if !self.pull_byte() {
                return false;
            }
        }
        true
    }

    /// Low `n` buffered bits (`n <= 32`).
    #[inline]
    pub fn peek(&self, n: u32) -> u32 {
        (self.bits.hold & ((1u64 << n) - 1)) as u32
    }

    /// Consume `n` buffered bits.
    #[inline]
    pub fn consume(&mut self, n: u32) {
        debug_assert!(n <= self.bits.count);
        self.bits.hold >>= n;
        self.bits.count -= n;
    }

    /// Read and consume `n` bits that are known to be buffered.
    #[inline]
    pub fn take(&mut self, n: u32) -> u32 {
        let value = self.peek(n);
        self.consume(n);
        value
    }

    /// Drop bits up to the next byte boundary.
    #[inline]
    pub fn align(&mut self) {
        let partial = self.bits.count & 7;
        self.consume(partial);
    }

    /// Take a whole byte from the accumulator, if one is buffered.
    #[inline]
    pub fn take_buffered_byte(&mut self) -> Option<u8> {
        (self.bits.count >= 8).then(|| self.take(8) as u8)
    }

    /// Take up to `max` bytes straight from the input.
    ///
    /// Only valid with no whole bytes buffered.
    pub fn take_input(&mut self, max: usize) -> &'a [u8] {
        debug_assert!(self.bits.count < 8);
        let n = max.min(self.input_remaining());
        let input: &'a [u8] = self.input;
        let slice = &input[self.in_pos..self.in_pos + n];
        self.in_pos += n;
        slice
    }

    /// Copy as much of `data` as fits into the output. Returns the count.
    pub fn write_output(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.output_remaining());
        self.output[self.out_pos..self.out_pos + n].copy_from_slice(&data[..n]);
        self.out_pos += n;
        n
    }

    /// Hand whole buffered bytes back to the input cursor.
    ///
    /// Only bytes pulled during this call can be returned; the rest stay in
    /// the accumulator. Returns the number of bytes given back.
    pub fn return_whole_bytes(&mut self) -> usize {
        let n = ((self.bits.count / 8) as usize).min(self.in_pos);
        if n > 0 {
            self.in_pos -= n;
            self.bits.count -= 8 * n as u32;
            self.bits.hold &= (1u64 << self.bits.count) - 1;
        }
        n
    }
}
