//! Block-level state machine.
//!
//! Reads block headers and drives each block type to completion:
//!
//! ```text
//! ReadingType ──0──> CopyingStored ─────────────────────────────┐
//!      │  ──1──> DecodingSymbols (fixed) ───────────────────────┤
//!      │  ──2──> ReadingDynamicHeader ─> ReadingCodeLengthTree  │
//!      │                 ─> ReadingSymbolLengths ─> DecodingSymbols
//!      └──3──> Error                                            │
//!  block done: final ? FlushingTail ─> Done : ReadingType <─────┘
//! ```
//!
//! Decoded bytes go to the sliding window; the window is flushed to the
//! caller's output whenever it fills up and once more at the end of the
//! stream.

use sluice_core::{Error, InflateStats, Result};
use tracing::debug;

use crate::adler32::Adler32;
use crate::codes::{CodeDecoder, CodeStatus, TableSet};
use crate::context::DecodeContext;
use crate::huffman::{
    build_bit_length_table, build_dynamic_tables, HuffmanTable, Op, CL_CODE_ORDER, END_OF_BLOCK,
    MAX_CL_CODES, MAX_DIST_CODES, MAX_LIT_CODES,
};
use crate::window::SlidingWindow;

/// Progress through a stored block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredPhase {
    /// Waiting for LEN and NLEN.
    Header,
    /// Copying the block body.
    Body { remaining: u16 },
}

/// Dynamic header being assembled.
#[derive(Debug)]
pub struct DynamicHeader {
    nlen: usize,
    ndist: usize,
    ncode: usize,
    /// Entries filled so far in the current array.
    have: usize,
    code_lengths: [u8; MAX_CL_CODES],
    lengths: [u8; MAX_LIT_CODES + MAX_DIST_CODES],
    code_table: Option<HuffmanTable>,
}

impl DynamicHeader {
    fn new(nlen: usize, ndist: usize, ncode: usize) -> Self {
        Self {
            nlen,
            ndist,
            ncode,
            have: 0,
            code_lengths: [0; MAX_CL_CODES],
            lengths: [0; MAX_LIT_CODES + MAX_DIST_CODES],
            code_table: None,
        }
    }
}

/// Block-level decode state.
#[derive(Debug)]
pub enum BlockState {
    /// About to read a block header.
    ReadingType,
    /// Inside a stored block.
    CopyingStored(StoredPhase),
    /// About to read HLIT, HDIST and HCLEN.
    ReadingDynamicHeader,
    /// Reading the 3-bit code length code lengths.
    ReadingCodeLengthTree(Box<DynamicHeader>),
    /// Reading the run-length coded literal/length and distance lengths.
    ReadingSymbolLengths(Box<DynamicHeader>),
    /// Decoding the symbols of a Huffman block.
    DecodingSymbols(Box<TableSet>),
    /// Final block decoded; emptying the window.
    FlushingTail,
    /// Stream complete.
    Done,
    /// Malformed data seen; terminal.
    Error,
}

impl BlockState {
    /// Static name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BlockState::ReadingType => "reading_type",
            BlockState::CopyingStored(_) => "copying_stored",
            BlockState::ReadingDynamicHeader => "reading_dynamic_header",
            BlockState::ReadingCodeLengthTree(_) => "reading_code_length_tree",
            BlockState::ReadingSymbolLengths(_) => "reading_symbol_lengths",
            BlockState::DecodingSymbols(_) => "decoding_symbols",
            BlockState::FlushingTail => "flushing_tail",
            BlockState::Done => "done",
            BlockState::Error => "error",
        }
    }
}

/// Why [`BlockDecoder::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Input exhausted.
    NeedInput,
    /// Window full and the output cannot take more.
    NeedOutput,
    /// A non-final block completed and the caller asked to stop there.
    BlockEnd,
    /// Every byte of the stream has been emitted.
    StreamEnd,
}

/// Options for one run of the block machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Allow the fast symbol loop.
    pub fast_path: bool,
    /// Return after each completed non-final block.
    pub stop_at_block: bool,
}

/// Everything the block machine writes to besides its own state.
pub struct Sink<'s> {
    /// History window.
    pub window: &'s mut SlidingWindow,
    /// Checksum of flushed bytes.
    pub adler: &'s mut Adler32,
    /// Block and fast path counters.
    pub stats: &'s mut InflateStats,
}

/// The block-level decoder.
#[derive(Debug)]
pub struct BlockDecoder {
    state: BlockState,
    last: bool,
    codes: CodeDecoder,
    message: Option<String>,
}

impl Default for BlockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDecoder {
    /// Create a decoder at the first block header.
    pub fn new() -> Self {
        Self {
            state: BlockState::ReadingType,
            last: false,
            codes: CodeDecoder::new(),
            message: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> &BlockState {
        &self.state
    }

    /// Diagnostic message of the error that stopped the stream.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Check if the stream is complete.
    pub fn is_done(&self) -> bool {
        matches!(self.state, BlockState::Done)
    }

    /// Check if the stream has failed.
    pub fn is_error(&self) -> bool {
        matches!(self.state, BlockState::Error)
    }

    /// Positioned at a block boundary: before a block header or before the
    /// length fields of a stored block.
    pub fn is_sync_point(&self) -> bool {
        matches!(
            self.state,
            BlockState::ReadingType | BlockState::CopyingStored(StoredPhase::Header)
        )
    }

    /// Back to the first block header.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Run until input or output runs out, the stream ends, or (with
    /// `stop_at_block`) a block completes.
    ///
    /// Malformed data moves the decoder to [`BlockState::Error`]; that call
    /// and every later one return the same corruption error.
    pub fn run(
        &mut self,
        ctx: &mut DecodeContext<'_>,
        sink: &mut Sink<'_>,
        options: RunOptions,
    ) -> Result<Signal> {
        if let BlockState::Error = self.state {
            let message = self.message.clone().unwrap_or_default();
            return Err(Error::corrupted(message));
        }

        match self.drive(ctx, sink, options) {
            Ok(signal) => Ok(signal),
            Err(err) => {
                let message = err.message().unwrap_or("corrupted data").to_string();
                debug!(
                    state = self.state.name(),
                    consumed = ctx.consumed(),
                    %message,
                    "deflate data error"
                );
                self.state = BlockState::Error;
                self.message = Some(message);
                Err(err)
            }
        }
    }

    fn drive(
        &mut self,
        ctx: &mut DecodeContext<'_>,
        sink: &mut Sink<'_>,
        options: RunOptions,
    ) -> Result<Signal> {
        loop {
            match &mut self.state {
                BlockState::ReadingType => {
                    if !ctx.need(3) {
                        return Ok(Signal::NeedInput);
                    }
                    self.last = ctx.take(1) == 1;
                    let block_type = ctx.take(2);
                    self.state = match block_type {
                        0 => {
                            ctx.align();
                            sink.stats.stored_blocks += 1;
                            BlockState::CopyingStored(StoredPhase::Header)
                        }
                        1 => {
                            sink.stats.fixed_blocks += 1;
                            self.codes.reset();
                            BlockState::DecodingSymbols(Box::new(TableSet::Fixed))
                        }
                        2 => {
                            sink.stats.dynamic_blocks += 1;
                            BlockState::ReadingDynamicHeader
                        }
                        _ => return Err(Error::corrupted("invalid block type")),
                    };
                    debug!(
                        block_type,
                        last = self.last,
                        next = self.state.name(),
                        "block header"
                    );
                }

                BlockState::CopyingStored(phase) => match *phase {
                    StoredPhase::Header => {
                        if !ctx.need(32) {
                            return Ok(Signal::NeedInput);
                        }
                        let len = ctx.take(16) as u16;
                        let nlen = ctx.take(16) as u16;
                        if len != !nlen {
                            return Err(Error::corrupted("invalid stored block lengths"));
                        }
                        debug!(len, "stored block");
                        *phase = StoredPhase::Body { remaining: len };
                    }
                    StoredPhase::Body { remaining: 0 } => {
                        if let Some(signal) = self.finish_block(options) {
                            return Ok(signal);
                        }
                    }
                    StoredPhase::Body { remaining } => {
                        if sink.window.free() == 0 {
                            if sink.window.flush(ctx, sink.adler) == 0 {
                                return Ok(Signal::NeedOutput);
                            }
                            continue;
                        }

                        let mut left = remaining as usize;
                        while left > 0 && sink.window.free() > 0 {
                            match ctx.take_buffered_byte() {
                                Some(byte) => {
                                    sink.window.push(byte);
                                    left -= 1;
                                }
                                None => break,
                            }
                        }
                        if left > 0 && ctx.available() < 8 {
                            let chunk = ctx.take_input(left.min(sink.window.free()));
                            left -= sink.window.write_slice(chunk);
                        }
                        *phase = StoredPhase::Body {
                            remaining: left as u16,
                        };

                        if left > 0 && sink.window.free() > 0 && ctx.input_remaining() == 0 {
                            return Ok(Signal::NeedInput);
                        }
                    }
                },

                BlockState::ReadingDynamicHeader => {
                    if !ctx.need(14) {
                        return Ok(Signal::NeedInput);
                    }
                    let nlen = ctx.take(5) as usize + 257;
                    let ndist = ctx.take(5) as usize + 1;
                    let ncode = ctx.take(4) as usize + 4;
                    if nlen > MAX_LIT_CODES || ndist > MAX_DIST_CODES {
                        return Err(Error::corrupted("too many length or distance symbols"));
                    }
                    debug!(nlen, ndist, ncode, "dynamic block header");
                    self.state = BlockState::ReadingCodeLengthTree(Box::new(DynamicHeader::new(
                        nlen, ndist, ncode,
                    )));
                }

                BlockState::ReadingCodeLengthTree(header) => {
                    while header.have < header.ncode {
                        if !ctx.need(3) {
                            return Ok(Signal::NeedInput);
                        }
                        header.code_lengths[CL_CODE_ORDER[header.have]] = ctx.take(3) as u8;
                        header.have += 1;
                    }
                    header.code_table = Some(build_bit_length_table(&header.code_lengths)?);
                    header.have = 0;

                    if let BlockState::ReadingCodeLengthTree(header) =
                        std::mem::replace(&mut self.state, BlockState::Error)
                    {
                        self.state = BlockState::ReadingSymbolLengths(header);
                    }
                }

                BlockState::ReadingSymbolLengths(header) => {
                    if !read_symbol_lengths(ctx, header)? {
                        return Ok(Signal::NeedInput);
                    }
                    if header.lengths[END_OF_BLOCK] == 0 {
                        return Err(Error::corrupted("invalid code -- missing end-of-block"));
                    }
                    let total = header.nlen + header.ndist;
                    let (literal, distance) =
                        build_dynamic_tables(&header.lengths[..total], header.nlen)?;
                    self.codes.reset();
                    let tables = TableSet::Dynamic { literal, distance };
                    self.state = BlockState::DecodingSymbols(Box::new(tables));
                }

                BlockState::DecodingSymbols(tables) => {
                    let status = self.codes.decode(
                        ctx,
                        sink.window,
                        tables,
                        options.fast_path,
                        sink.stats,
                    )?;
                    match status {
                        CodeStatus::EndOfBlock => {
                            if let Some(signal) = self.finish_block(options) {
                                return Ok(signal);
                            }
                        }
                        CodeStatus::NeedInput => return Ok(Signal::NeedInput),
                        CodeStatus::WindowFull => {
                            if sink.window.flush(ctx, sink.adler) == 0 {
                                return Ok(Signal::NeedOutput);
                            }
                        }
                    }
                }

                BlockState::FlushingTail => {
                    sink.window.flush(ctx, sink.adler);
                    if sink.window.pending() > 0 {
                        return Ok(Signal::NeedOutput);
                    }
                    self.state = BlockState::Done;
                    debug!(consumed = ctx.consumed(), "end of stream");
                }

                BlockState::Done => return Ok(Signal::StreamEnd),

                BlockState::Error => {
                    let message = self.message.clone().unwrap_or_default();
                    return Err(Error::corrupted(message));
                }
            }
        }
    }

    /// Leave a completed block of any type. Returns the signal to stop
    /// with when the caller asked to stop at block boundaries.
    fn finish_block(&mut self, options: RunOptions) -> Option<Signal> {
        if self.last {
            self.state = BlockState::FlushingTail;
            return None;
        }
        self.state = BlockState::ReadingType;
        options.stop_at_block.then_some(Signal::BlockEnd)
    }
}

/// Decode run-length coded code lengths into `header.lengths`.
///
/// Each symbol is consumed together with its extra bits, so a suspension
/// never splits a repeat. Returns `false` when input runs out first.
fn read_symbol_lengths(ctx: &mut DecodeContext<'_>, header: &mut DynamicHeader) -> Result<bool> {
    let total = header.nlen + header.ndist;
    let Some(table) = header.code_table.as_ref() else {
        return Err(Error::invalid_state("code length table", "none"));
    };

    while header.have < total {
        let (code, bits) = loop {
            if let Some(found) = table.decode(ctx.hold(), ctx.available()) {
                break found;
            }
            if !ctx.pull_byte() {
                return Ok(false);
            }
        };
        if code.op != Op::Literal {
            return Err(Error::corrupted("invalid code lengths set"));
        }

        let symbol = code.val;
        if symbol < 16 {
            ctx.consume(bits);
            header.lengths[header.have] = symbol as u8;
            header.have += 1;
            continue;
        }

        let (extra, base) = match symbol {
            16 => (2, 3),
            17 => (3, 3),
            _ => (7, 11),
        };
        if !ctx.need(bits + extra) {
            return Ok(false);
        }
        ctx.consume(bits);
        let repeat = base + ctx.take(extra) as usize;

        let value = if symbol == 16 {
            if header.have == 0 {
                return Err(Error::corrupted("invalid bit length repeat"));
            }
            header.lengths[header.have - 1]
        } else {
            0
        };
        if header.have + repeat > total {
            return Err(Error::corrupted("invalid bit length repeat"));
        }
        header.lengths[header.have..header.have + repeat].fill(value);
        header.have += repeat;
    }

    Ok(true)
}
